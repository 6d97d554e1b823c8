//! Protocol implementations.

pub mod crc;
pub mod frame;
pub mod receiver;

// Re-export common types
pub use frame::{FileInfo, FrameKind, control, parse_ascii_uint};
pub use receiver::{Received, ReceiverConfig, YmodemReceiver};
