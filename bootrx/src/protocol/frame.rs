//! YMODEM frame parsing.
//!
//! ## Frame format
//!
//! A frame is announced by a one-byte marker (SOH or STX) that the
//! state machine consumes while hunting for frame starts. Everything
//! after the marker has a fixed length per frame kind:
//!
//! ```text
//! +------+------+----------------------+--------+
//! | SEQ  | ~SEQ |  DATA (128 or 1024)  | CRC16  |
//! +------+------+----------------------+--------+
//! | 1    | 1    |     128 / 1024       | 2      |
//! +------+------+----------------------+--------+
//! ```
//!
//! The CRC (big-endian, CRC-16/XMODEM) covers the data region only.
//! The header frame (block 0) carries `name\0length\0` plus zero
//! padding instead of image data; its lead bytes are exactly
//! `0x00, 0xFF`. Data frames only require the two lead bytes to be a
//! complementary pair — no expected-sequence check is made, matching
//! the sender conventions this engine was built against.

use crate::error::{Error, Result};
use crate::port::{Port, read_bytes};
use crate::protocol::crc::crc16_xmodem;
use byteorder::{BigEndian, ByteOrder};
use log::trace;

/// YMODEM control characters.
pub mod control {
    /// Start of Header (128-byte block).
    pub const SOH: u8 = 0x01;
    /// Start of Text (1024-byte block).
    pub const STX: u8 = 0x02;
    /// End of Transmission.
    pub const EOT: u8 = 0x04;
    /// Acknowledge.
    pub const ACK: u8 = 0x06;
    /// Not Acknowledge.
    pub const NAK: u8 = 0x15;
    /// Cancel (defined by the protocol; this receiver never emits it).
    pub const CAN: u8 = 0x18;
    /// CRC mode request character, receiver to sender.
    pub const C: u8 = b'C';
    /// Interrupt (Ctrl-C): the operator aborts the session.
    pub const INTR: u8 = 0x03;
}

/// Payload size of a SOH frame.
pub const SOH_PAYLOAD_LEN: usize = 128;

/// Payload size of a STX frame (YMODEM-1K).
pub const STX_PAYLOAD_LEN: usize = 1024;

/// Frame kind, selected by the marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Short frame, 128-byte payload.
    Soh,
    /// Long frame, 1024-byte payload.
    Stx,
}

impl FrameKind {
    /// Map a received marker byte to a frame kind.
    pub fn from_marker(byte: u8) -> Option<Self> {
        match byte {
            control::SOH => Some(Self::Soh),
            control::STX => Some(Self::Stx),
            _ => None,
        }
    }

    /// Payload bytes carried by this frame kind.
    pub fn payload_len(self) -> usize {
        match self {
            Self::Soh => SOH_PAYLOAD_LEN,
            Self::Stx => STX_PAYLOAD_LEN,
        }
    }

    /// Total bytes on the wire after the marker: two lead bytes,
    /// payload, two CRC bytes.
    pub fn frame_len(self) -> usize {
        self.payload_len() + 4
    }
}

/// Decoded header frame: file name and declared image length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Transferred file name (may be empty).
    pub name: String,
    /// Declared total image length in bytes.
    pub length: u32,
}

/// Parse an unsigned integer from an ASCII field.
///
/// A `0x`/`0X` prefix selects hexadecimal (upper or lower case
/// digits), anything else is decimal. Parsing stops at the first byte
/// that is not a digit of the active base, so a NUL or other
/// terminator simply ends the number.
pub fn parse_ascii_uint(buf: &[u8]) -> u32 {
    let (radix, digits) =
        if buf.len() >= 2 && buf[0] == b'0' && (buf[1] == b'x' || buf[1] == b'X') {
            (16u32, &buf[2..])
        } else {
            (10u32, buf)
        };

    let mut value: u32 = 0;
    for &byte in digits {
        let digit = match byte {
            b'0'..=b'9' => u32::from(byte - b'0'),
            b'A'..=b'F' if radix == 16 => u32::from(byte - b'A' + 10),
            b'a'..=b'f' if radix == 16 => u32::from(byte - b'a' + 10),
            _ => return value,
        };
        value = value.wrapping_mul(radix).wrapping_add(digit);
    }
    value
}

/// Pull a complete frame body off the wire.
///
/// The marker byte has already been consumed by the caller; this
/// reads exactly `frame_len` further bytes within the poll budget.
/// Anything short is a parse failure, never a partial frame.
fn read_frame<P: Port>(port: &mut P, kind: FrameKind, budget: u32) -> Result<Vec<u8>> {
    let mut frame = vec![0u8; kind.frame_len()];
    let got = read_bytes(port, &mut frame, budget);
    if got != frame.len() {
        trace!("short frame read: {got}/{} bytes", frame.len());
        return Err(Error::Malformed("short frame read"));
    }
    Ok(frame)
}

/// Validate the CRC trailer against the payload region.
fn check_crc(frame: &[u8]) -> Result<()> {
    let tail = frame.len() - 2;
    let computed = crc16_xmodem(&frame[2..tail]);
    let received = BigEndian::read_u16(&frame[tail..]);
    if computed != received {
        trace!("crc mismatch: computed {computed:#06x}, received {received:#06x}");
        return Err(Error::Malformed("crc mismatch"));
    }
    Ok(())
}

/// Receive and decode a header frame (block 0).
///
/// Returns the declared file name and length on success. A declared
/// length of zero reports as [`Error::Malformed`] — that is also how
/// the all-zero batch-terminator frame presents, and the state
/// machine tells the two apart from session context. A declared
/// length above `max_len` reports as the distinct
/// [`Error::FileTooLarge`].
pub fn parse_header<P: Port>(
    port: &mut P,
    kind: FrameKind,
    budget: u32,
    max_len: u32,
) -> Result<FileInfo> {
    let frame = read_frame(port, kind, budget)?;
    if frame[0] != 0x00 || frame[1] != 0xFF {
        return Err(Error::Malformed("bad header lead bytes"));
    }
    check_crc(&frame)?;

    let payload = &frame[2..frame.len() - 2];
    let name_end = payload
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::Malformed("unterminated name field"))?;
    let size_field = &payload[name_end + 1..];
    let size_end = size_field
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::Malformed("unterminated length field"))?;

    let length = parse_ascii_uint(&size_field[..size_end]);
    if length == 0 {
        // Real headers always declare a size; an all-zero payload is
        // the batch terminator and lands here as well.
        return Err(Error::Malformed("zero declared length"));
    }
    if length > max_len {
        return Err(Error::FileTooLarge {
            declared: length,
            limit: max_len,
        });
    }

    Ok(FileInfo {
        name: String::from_utf8_lossy(&payload[..name_end]).into_owned(),
        length,
    })
}

/// Receive and validate a data frame, returning its payload region.
///
/// The two lead bytes must sum to 0xFF (any complementary
/// sequence-number pair is accepted) and the CRC trailer must match.
pub fn parse_data<P: Port>(port: &mut P, kind: FrameKind, budget: u32) -> Result<Vec<u8>> {
    let mut frame = read_frame(port, kind, budget)?;
    if u16::from(frame[0]) + u16::from(frame[1]) != 0xFF {
        return Err(Error::Malformed("bad sequence pair"));
    }
    check_crc(&frame)?;

    frame.truncate(frame.len() - 2);
    frame.drain(..2);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockPort, data_body, frame_body, header_body, terminator_body};

    const BUDGET: u32 = 10_000;

    #[test]
    fn test_frame_kind_from_marker() {
        assert_eq!(FrameKind::from_marker(control::SOH), Some(FrameKind::Soh));
        assert_eq!(FrameKind::from_marker(control::STX), Some(FrameKind::Stx));
        assert_eq!(FrameKind::from_marker(control::EOT), None);
    }

    #[test]
    fn test_frame_lengths() {
        assert_eq!(FrameKind::Soh.frame_len(), 132);
        assert_eq!(FrameKind::Stx.frame_len(), 1028);
    }

    #[test]
    fn test_parse_ascii_uint_decimal() {
        assert_eq!(parse_ascii_uint(b"2048"), 2048);
        assert_eq!(parse_ascii_uint(b"0"), 0);
    }

    #[test]
    fn test_parse_ascii_uint_hex() {
        assert_eq!(parse_ascii_uint(b"0x1F400"), 0x1F400);
        assert_eq!(parse_ascii_uint(b"0Xab"), 0xAB);
    }

    #[test]
    fn test_parse_ascii_uint_stops_at_junk() {
        assert_eq!(parse_ascii_uint(b"123abc"), 123);
        assert_eq!(parse_ascii_uint(b"0x12g4"), 0x12);
        assert_eq!(parse_ascii_uint(b"42\0junk"), 42);
    }

    #[test]
    fn test_parse_header_valid() {
        let mut port = MockPort::new(&header_body(FrameKind::Soh, "app.bin", "2048"));
        let info = parse_header(&mut port, FrameKind::Soh, BUDGET, 4096).unwrap();
        assert_eq!(info.name, "app.bin");
        assert_eq!(info.length, 2048);
    }

    #[test]
    fn test_parse_header_hex_length() {
        let mut port = MockPort::new(&header_body(FrameKind::Soh, "fw", "0x800"));
        let info = parse_header(&mut port, FrameKind::Soh, BUDGET, 4096).unwrap();
        assert_eq!(info.length, 0x800);
    }

    #[test]
    fn test_parse_header_oversize_is_distinct() {
        let mut port = MockPort::new(&header_body(FrameKind::Soh, "big.bin", "8192"));
        let err = parse_header(&mut port, FrameKind::Soh, BUDGET, 4096).unwrap_err();
        assert!(matches!(
            err,
            Error::FileTooLarge {
                declared: 8192,
                limit: 4096
            }
        ));
    }

    #[test]
    fn test_parse_header_short_read() {
        let body = header_body(FrameKind::Soh, "app.bin", "2048");
        let mut port = MockPort::new(&body[..50]);
        let err = parse_header(&mut port, FrameKind::Soh, BUDGET, 4096).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[test]
    fn test_parse_header_bad_lead_bytes() {
        let mut body = header_body(FrameKind::Soh, "app.bin", "2048");
        body[1] = 0xFE;
        let mut port = MockPort::new(&body);
        let err = parse_header(&mut port, FrameKind::Soh, BUDGET, 4096).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[test]
    fn test_parse_header_crc_mismatch() {
        let mut body = header_body(FrameKind::Soh, "app.bin", "2048");
        let tail = body.len() - 1;
        body[tail] ^= 0xFF;
        let mut port = MockPort::new(&body);
        let err = parse_header(&mut port, FrameKind::Soh, BUDGET, 4096).unwrap_err();
        assert!(matches!(err, Error::Malformed("crc mismatch")));
    }

    #[test]
    fn test_parse_header_terminator_reports_malformed() {
        let mut port = MockPort::new(&terminator_body(FrameKind::Soh));
        let err = parse_header(&mut port, FrameKind::Soh, BUDGET, 4096).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[test]
    fn test_parse_data_valid() {
        let payload = vec![0x5A; 64];
        let mut port = MockPort::new(&data_body(FrameKind::Soh, 1, &payload));
        let out = parse_data(&mut port, FrameKind::Soh, BUDGET).unwrap();
        assert_eq!(out.len(), SOH_PAYLOAD_LEN);
        assert_eq!(&out[..64], &payload[..]);
        assert!(out[64..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_parse_data_accepts_any_complementary_pair() {
        // Sequence value is not checked, only that the pair sums to 0xFF
        let mut port = MockPort::new(&data_body(FrameKind::Stx, 0x7C, &[1, 2, 3]));
        assert!(parse_data(&mut port, FrameKind::Stx, BUDGET).is_ok());
    }

    #[test]
    fn test_parse_data_rejects_non_complementary_pair() {
        let body = frame_body(FrameKind::Soh, [0x01, 0x01], &[1, 2, 3]);
        let mut port = MockPort::new(&body);
        let err = parse_data(&mut port, FrameKind::Soh, BUDGET).unwrap_err();
        assert!(matches!(err, Error::Malformed("bad sequence pair")));
    }

    #[test]
    fn test_parse_data_crc_mismatch() {
        let mut body = data_body(FrameKind::Stx, 1, &[0xEE; 1024]);
        body[100] ^= 0x01;
        let mut port = MockPort::new(&body);
        let err = parse_data(&mut port, FrameKind::Stx, BUDGET).unwrap_err();
        assert!(matches!(err, Error::Malformed("crc mismatch")));
    }

    #[test]
    fn test_parse_data_short_read() {
        let body = data_body(FrameKind::Stx, 1, &[0xEE; 1024]);
        let mut port = MockPort::new(&body[..1000]);
        let err = parse_data(&mut port, FrameKind::Stx, BUDGET).unwrap_err();
        assert!(matches!(err, Error::Malformed("short frame read")));
    }
}
