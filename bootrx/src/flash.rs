//! Flash write coordination.
//!
//! The receive engine streams payloads straight into a target flash
//! region. This module owns the two disciplines that protect the
//! device's only bootable image while it does so:
//!
//! - writes are clipped so they never pass the session limit, and
//! - erasure always precedes the write it protects, with each sector
//!   erased at most once per session (the "erase frontier").

use crate::error::Result;
use log::{debug, trace};

/// Backend flash driver consumed by the engine.
///
/// Implementations map to the device's sector-erase / linear-write
/// primitives, or to a file-backed image on a host.
pub trait FlashStorage {
    /// Erase granularity in bytes. Erase addresses passed to
    /// [`FlashStorage::erase`] are always multiples of this.
    fn sector_size(&self) -> u32;

    /// Erase one sector starting at the given sector-aligned address.
    fn erase(&mut self, sector_addr: u32) -> Result<()>;

    /// Write bytes linearly starting at `addr`. The target range has
    /// been erased beforehand by the coordinator.
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()>;
}

/// Caller-declared writable window, taken from partition metadata and
/// immutable for the session.
#[derive(Debug, Clone, Copy)]
pub struct FlashRegion {
    /// First writable address.
    pub base: u32,
    /// Maximum number of bytes that may be written from `base`.
    pub max_len: u32,
}

impl FlashRegion {
    /// Exclusive end of the writable window, saturated at the top of
    /// the 32-bit address space.
    pub fn end(&self) -> u32 {
        self.base.saturating_add(self.max_len)
    }
}

/// Session-scoped write coordinator.
///
/// Tracks the write limit and the erase frontier (exclusive end of
/// the region erased so far; monotonically non-decreasing).
#[derive(Debug)]
pub struct FlashWriter {
    base: u32,
    limit: u32,
    frontier: u32,
}

impl FlashWriter {
    /// Create a coordinator for one receive session over `region`.
    pub fn new(region: FlashRegion) -> Self {
        Self {
            base: region.base,
            limit: region.end(),
            frontier: 0,
        }
    }

    /// Tighten the write limit to the length declared by the header
    /// frame. Trailing padding in the sender's final block is then
    /// silently dropped instead of spilling past the image.
    pub fn set_image_len(&mut self, len: u32) {
        self.limit = self.base.saturating_add(len);
        debug!("write limit set to {:#x}", self.limit);
    }

    /// Write a payload at `addr`, erasing ahead as needed.
    ///
    /// The payload is clipped so the write never passes the limit; a
    /// straddling write is truncated to the remaining capacity rather
    /// than rejected. Returns the number of bytes actually written.
    pub fn write<F: FlashStorage>(
        &mut self,
        flash: &mut F,
        addr: u32,
        data: &[u8],
    ) -> Result<usize> {
        let requested = u32::try_from(data.len()).unwrap_or(u32::MAX);
        let len = requested.min(self.limit.saturating_sub(addr));
        if len == 0 {
            trace!("write at {addr:#x} fully clipped, nothing to do");
            return Ok(0);
        }

        let end = addr + len;
        if self.frontier < end {
            let sector = flash.sector_size();
            let sector_base = end / sector * sector;
            debug!("erasing sector at {sector_base:#x}");
            flash.erase(sector_base)?;
            self.frontier = sector_base.saturating_add(sector);
        }

        trace!("writing {len} bytes at {addr:#x}");
        flash.write(addr, &data[..len as usize])?;
        Ok(len as usize)
    }
}
