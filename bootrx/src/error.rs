//! Error types for bootrx.

use std::io;
use thiserror::Error;

/// Result type for bootrx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for bootrx operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (serial port, file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[cfg(feature = "native")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Structurally invalid frame: short read, bad envelope bytes, or
    /// CRC mismatch. Recoverable at the protocol level (NAK/retry);
    /// fatal to the session once the retry path is exhausted.
    #[error("Malformed frame: {0}")]
    Malformed(&'static str),

    /// The header declared a file larger than the writable region.
    ///
    /// Reported distinctly from [`Error::Malformed`] so the operator
    /// learns the real cause instead of a generic protocol failure.
    #[error("File too large: declared {declared:#x} bytes, limit {limit:#x}")]
    FileTooLarge {
        /// Length declared by the header frame.
        declared: u32,
        /// Maximum permitted length for the session.
        limit: u32,
    },

    /// The sender (or operator) interrupted the session.
    #[error("Transfer aborted")]
    Aborted,

    /// No sender appeared within the configured idle budget.
    #[error("Timeout: {0}")]
    Timeout(&'static str),

    /// Flash backend failure (erase or write).
    #[error("Flash error: {0}")]
    Flash(String),
}
