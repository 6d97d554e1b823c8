//! # bootrx
//!
//! A YMODEM receive engine for second-stage boot loaders.
//!
//! This crate accepts a binary image sent over a byte-serial link
//! using YMODEM framing and streams it directly into a target flash
//! region, enforcing size limits and sector-erase discipline as it
//! goes. The pieces:
//!
//! - CRC16-XMODEM checksum validation of every frame
//! - Fixed-envelope packet parsing (header and data frames)
//! - A flash write coordinator that clips writes to the declared
//!   image size and erases each sector at most once per session
//! - The transfer state machine driving the ACK/NAK exchange
//!
//! The engine is generic over two collaborator traits: [`Port`] (the
//! byte link) and [`FlashStorage`] (the flash driver), so it runs
//! unchanged against real hardware, a host serial adapter, or
//! scripted test doubles.
//!
//! ## Features
//!
//! - `native` (default): serial port backend via the `serialport`
//!   crate
//!
//! ## Example
//!
//! ```rust,no_run
//! use bootrx::{FlashRegion, NativePort, YmodemReceiver};
//! # struct MyFlash;
//! # impl bootrx::FlashStorage for MyFlash {
//! #     fn sector_size(&self) -> u32 { 4096 }
//! #     fn erase(&mut self, _: u32) -> bootrx::Result<()> { Ok(()) }
//! #     fn write(&mut self, _: u32, _: &[u8]) -> bootrx::Result<()> { Ok(()) }
//! # }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut port = NativePort::open("/dev/ttyUSB0", 115200)?;
//!     let mut flash = MyFlash;
//!     let region = FlashRegion { base: 0x0001_0000, max_len: 0x0004_0000 };
//!
//!     let received = YmodemReceiver::new(&mut port, &mut flash, region)
//!         .receive(|current, total| println!("{current}/{total}"))?;
//!
//!     println!("received {} ({} bytes)", received.name, received.length);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod flash;
pub mod port;
pub mod protocol;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenience
// Native-specific re-exports
#[cfg(feature = "native")]
pub use port::native::NativePort;
pub use {
    error::{Error, Result},
    flash::{FlashRegion, FlashStorage, FlashWriter},
    port::{Port, read_bytes},
    protocol::{
        FileInfo, FrameKind, Received, ReceiverConfig, YmodemReceiver, control, parse_ascii_uint,
    },
};
