//! Port abstraction for the byte-serial link.
//!
//! The receive engine is driven by single-byte polling over a
//! half-duplex link. This module provides the [`Port`] trait the
//! engine is generic over, plus the budgeted byte reader used to pull
//! whole frames off the wire.
//!
//! ## Architecture
//!
//! The design separates I/O from protocol logic, allowing the
//! protocol layer to be driven by a real serial port on native
//! platforms or by a scripted mock in tests.
//!
//! ```text
//! +----------------------+
//! |    Protocol Layer    |
//! |  (frame, receiver)   |
//! +----------+-----------+
//!            |
//!            v
//! +----------+-----------+
//! |      Port Trait      |
//! +----------+-----------+
//!            |
//!            v
//! +----------+-----------+
//! |  NativePort / mocks  |
//! |     (serialport)     |
//! +----------------------+
//! ```

#[cfg(feature = "native")]
pub mod native;

/// A half-duplex byte link with a pacing primitive.
///
/// All three operations are infallible by contract: a transport
/// hiccup on receive reads as "no byte", and sends are fire-and-
/// forget, mirroring the polled-UART discipline of a boot-time
/// receiver. Implementations should log failures at `trace!` level
/// rather than surface them.
pub trait Port {
    /// Poll for a single byte. Returns `None` when nothing arrived
    /// within the implementation's (short) poll window.
    fn recv_byte(&mut self) -> Option<u8>;

    /// Send a single byte.
    fn send_byte(&mut self, byte: u8);

    /// Pause for the given number of milliseconds.
    ///
    /// Used for the settle delays between acknowledgement and the
    /// next sync request; test doubles may treat it as a no-op.
    fn delay_ms(&mut self, ms: u32);
}

/// Pull up to `buf.len()` bytes from the port within a poll budget.
///
/// Every poll attempt consumes one budget unit whether or not a byte
/// arrived, so the call is bounded by `budget` polls total. Returns
/// the number of bytes actually read; a short result is a legitimate
/// outcome that callers must check, not an error.
pub fn read_bytes<P: Port>(port: &mut P, buf: &mut [u8], budget: u32) -> usize {
    let mut read = 0;
    let mut spent = 0;

    while read < buf.len() && spent < budget {
        if let Some(byte) = port.recv_byte() {
            buf[read] = byte;
            read += 1;
        }
        spent += 1;
    }

    read
}
