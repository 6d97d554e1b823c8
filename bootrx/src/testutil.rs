//! Test doubles and wire-frame builders shared by the protocol tests.

use crate::port::Port;
use crate::protocol::crc::crc16_xmodem;
use crate::protocol::frame::FrameKind;
use byteorder::{BigEndian, WriteBytesExt};
use std::collections::VecDeque;

/// Scripted port: replays a fixed inbound byte stream and records
/// everything the engine sends. An exhausted script reads as silence.
pub(crate) struct MockPort {
    pub incoming: VecDeque<u8>,
    pub sent: Vec<u8>,
    pub delays: Vec<u32>,
}

impl MockPort {
    pub fn new(script: &[u8]) -> Self {
        Self {
            incoming: script.iter().copied().collect(),
            sent: Vec::new(),
            delays: Vec::new(),
        }
    }
}

impl Port for MockPort {
    fn recv_byte(&mut self) -> Option<u8> {
        self.incoming.pop_front()
    }

    fn send_byte(&mut self, byte: u8) {
        self.sent.push(byte);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }
}

/// Frame body (everything after the marker byte): two lead bytes,
/// fixed-size payload, big-endian CRC over the payload.
pub(crate) fn frame_body(kind: FrameKind, lead: [u8; 2], data: &[u8]) -> Vec<u8> {
    let mut payload = data.to_vec();
    payload.resize(kind.payload_len(), 0);

    let mut body = Vec::with_capacity(kind.frame_len());
    body.extend_from_slice(&lead);
    body.extend_from_slice(&payload);
    body.write_u16::<BigEndian>(crc16_xmodem(&payload))
        .expect("vec write");
    body
}

/// Header frame body carrying `name\0size\0` and zero padding.
pub(crate) fn header_body(kind: FrameKind, name: &str, size_field: &str) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(name.as_bytes());
    data.push(0);
    data.extend_from_slice(size_field.as_bytes());
    data.push(0);
    frame_body(kind, [0x00, 0xFF], &data)
}

/// Data frame body with a complementary sequence-number pair.
pub(crate) fn data_body(kind: FrameKind, seq: u8, data: &[u8]) -> Vec<u8> {
    frame_body(kind, [seq, !seq], data)
}

/// All-zero header-shaped body: the batch terminator.
pub(crate) fn terminator_body(kind: FrameKind) -> Vec<u8> {
    frame_body(kind, [0x00, 0xFF], &[])
}
