//! YMODEM receive state machine.
//!
//! Drives one complete transfer session: invite the sender with `C`,
//! accept the header (block 0), stream data frames into flash through
//! the write coordinator, and close the session on the double-EOT
//! handshake followed by the batch terminator.
//!
//! ```text
//! Init -> WaitHeader -> WaitData -> WaitEnd
//!   ^         |                        |
//!   |   (no byte yet)                  | second EOT
//!   +---------+------------------------+
//! ```
//!
//! Retransmission of a corrupted data frame is entirely the sender's
//! business: the receiver simply withholds the ACK and keeps waiting.

use crate::error::{Error, Result};
use crate::flash::{FlashRegion, FlashStorage, FlashWriter};
use crate::port::{Port, read_bytes};
use crate::protocol::frame::{self, FrameKind, control};
use log::{debug, trace};

/// Tuning knobs for one receive session.
///
/// All budgets are poll counts, not wall-clock time, so a session can
/// be driven deterministically by a scripted port in tests.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Poll budget for reading one full frame body.
    pub frame_budget: u32,
    /// Poll budget for reading a single byte between frames.
    pub byte_budget: u32,
    /// Idle iterations between `C` sync emissions while no sender
    /// has shown up.
    pub sync_interval: u32,
    /// Number of NAK bytes sent when a header cycle fails for real.
    pub nak_burst: u32,
    /// Settle delay (ms) between the header ACK and the data-phase
    /// `C` request.
    pub ack_settle_ms: u32,
    /// Settle delay (ms) before closing the session after the final
    /// header cycle.
    pub close_settle_ms: u32,
    /// Give up waiting for a header after this many idle cycles.
    /// `None` waits forever, like a boot loader parked on its UART.
    pub idle_limit: Option<u32>,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            frame_budget: 400_000,
            byte_budget: 5_000,
            sync_interval: 500,
            nak_burst: 5,
            ack_settle_ms: 100,
            close_settle_ms: 1000,
            idle_limit: None,
        }
    }
}

/// Final report of a successful session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// File name from the header frame.
    pub name: String,
    /// Declared image length in bytes.
    pub length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    WaitHeader,
    WaitData,
    WaitEnd,
}

/// YMODEM receive engine.
///
/// Borrows the byte link and the flash backend for the duration of a
/// session; all session state lives in [`YmodemReceiver::receive`],
/// so the engine is re-entrant across calls.
pub struct YmodemReceiver<'a, P: Port, F: FlashStorage> {
    port: &'a mut P,
    flash: &'a mut F,
    region: FlashRegion,
    config: ReceiverConfig,
}

impl<'a, P: Port, F: FlashStorage> YmodemReceiver<'a, P, F> {
    /// Create a receiver for the given writable flash region.
    pub fn new(port: &'a mut P, flash: &'a mut F, region: FlashRegion) -> Self {
        Self {
            port,
            flash,
            region,
            config: ReceiverConfig::default(),
        }
    }

    /// Create a receiver with a custom configuration.
    pub fn with_config(
        port: &'a mut P,
        flash: &'a mut F,
        region: FlashRegion,
        config: ReceiverConfig,
    ) -> Self {
        Self {
            port,
            flash,
            region,
            config,
        }
    }

    /// Run one receive session to completion.
    ///
    /// `progress` is called after every accepted data frame with
    /// `(bytes_received, declared_total)`.
    ///
    /// Returns [`Received`] after a clean double-EOT handshake and
    /// terminator frame; otherwise [`Error::FileTooLarge`],
    /// [`Error::Malformed`], [`Error::Aborted`] or [`Error::Timeout`].
    /// Flash backend failures propagate as-is.
    pub fn receive<C>(&mut self, mut progress: C) -> Result<Received>
    where
        C: FnMut(u32, u32),
    {
        let mut writer = FlashWriter::new(self.region);
        let mut cursor = self.region.base;
        let mut name = String::new();
        let mut length: u32 = 0;
        let mut end_of_batch = false;
        let mut idle: u32 = 0;
        let mut state = State::Init;

        debug!(
            "receive session: base {:#x}, max {:#x}",
            self.region.base, self.region.max_len
        );

        loop {
            let byte = if state == State::Init {
                None
            } else {
                self.read_one()
            };

            match state {
                State::Init => {
                    if idle % self.config.sync_interval == 0 {
                        trace!("sync request");
                        self.port.send_byte(control::C);
                    }
                    state = State::WaitHeader;
                },

                State::WaitHeader => {
                    let Some(b) = byte else {
                        idle += 1;
                        if let Some(limit) = self.config.idle_limit {
                            if idle > limit {
                                // A sender that never bothers with the
                                // terminator block still counts as done
                                // once the EOT handshake has completed.
                                return if end_of_batch {
                                    Ok(Received { name, length })
                                } else {
                                    Err(Error::Timeout("no header frame received"))
                                };
                            }
                        }
                        state = State::Init;
                        continue;
                    };

                    if let Some(kind) = FrameKind::from_marker(b) {
                        match frame::parse_header(
                            self.port,
                            kind,
                            self.config.frame_budget,
                            self.region.max_len,
                        ) {
                            Ok(info) => {
                                debug!("header: {:?}, {} bytes", info.name, info.length);
                                writer.set_image_len(info.length);
                                name = info.name;
                                length = info.length;
                                self.port.send_byte(control::ACK);
                                self.port.delay_ms(self.config.ack_settle_ms);
                                self.port.send_byte(control::C);
                                state = State::WaitData;
                            },
                            Err(err) => {
                                // The sender expects a response either
                                // way; the ACK lets it move past the
                                // terminator block.
                                self.port.send_byte(control::ACK);
                                self.port.delay_ms(self.config.close_settle_ms);
                                if end_of_batch {
                                    debug!("terminator received, session complete");
                                    return Ok(Received { name, length });
                                }
                                for _ in 0..self.config.nak_burst {
                                    self.port.send_byte(control::NAK);
                                }
                                return Err(err);
                            },
                        }
                    } else if b == control::INTR {
                        debug!("abort requested");
                        return Err(Error::Aborted);
                    }
                },

                State::WaitData => {
                    let Some(b) = byte else { continue };
                    if let Some(kind) = FrameKind::from_marker(b) {
                        match frame::parse_data(self.port, kind, self.config.frame_budget) {
                            Ok(payload) => {
                                writer.write(self.flash, cursor, &payload)?;
                                cursor += u32::try_from(payload.len()).unwrap_or(u32::MAX);
                                self.port.send_byte(control::ACK);
                                progress((cursor - self.region.base).min(length), length);
                            },
                            Err(Error::Malformed(reason)) => {
                                // No ACK: the sender's own timeout
                                // drives the retransmission.
                                trace!("bad data frame ({reason}), awaiting retransmission");
                            },
                            Err(err) => return Err(err),
                        }
                    } else if b == control::EOT {
                        // The first EOT is NAK'd to request a repeat
                        trace!("first EOT");
                        self.port.send_byte(control::NAK);
                        state = State::WaitEnd;
                    }
                },

                State::WaitEnd => {
                    if byte == Some(control::EOT) {
                        debug!("EOT handshake complete");
                        self.port.send_byte(control::ACK);
                        idle = 0;
                        end_of_batch = true;
                        state = State::Init;
                    }
                },
            }
        }
    }

    fn read_one(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        if read_bytes(self.port, &mut buf, self.config.byte_budget) == 1 {
            Some(buf[0])
        } else {
            None
        }
    }
}
