//! Native serial port implementation using the `serialport` crate.
//!
//! Adapts a blocking serial handle to the engine's polled [`Port`]
//! contract: reads use a short per-poll timeout and report `None` on
//! timeout, writes are fire-and-forget with failures logged.

use {
    crate::{error::Result, port::Port},
    log::trace,
    std::{io::Read, io::Write, thread, time::Duration},
};

/// Per-poll read timeout. Kept short so one `recv_byte` call stays
/// close to one unit of the engine's poll budget.
const POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Native serial port implementation.
pub struct NativePort {
    port: Box<dyn serialport::SerialPort>,
}

impl NativePort {
    /// Open a serial port at the given baud rate (8N1, no flow
    /// control), configured for single-byte polling.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(POLL_TIMEOUT)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()?;

        Ok(Self { port })
    }

    /// Discard anything buffered in both directions. Stale bytes left
    /// over from the boot banner or a previous transfer would otherwise
    /// desynchronize the first frame.
    pub fn clear_buffers(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::All)?;
        Ok(())
    }
}

impl Port for NativePort {
    fn recv_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            Ok(_) => None,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => None,
            Err(e) => {
                trace!("recv_byte error (treated as no data): {e}");
                None
            },
        }
    }

    fn send_byte(&mut self, byte: u8) {
        if let Err(e) = self
            .port
            .write_all(&[byte])
            .and_then(|()| self.port.flush())
        {
            trace!("send_byte 0x{byte:02X} failed: {e}");
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
