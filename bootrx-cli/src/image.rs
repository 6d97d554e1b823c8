//! File-backed flash image.
//!
//! On a host there is no real flash; writes land in a memory buffer
//! covering the sector-aligned span of the target region, and the
//! received image is saved to disk once the transfer succeeds.

use anyhow::{Context, Result};
use bootrx::{Error, FlashRegion, FlashStorage};
use std::fs;
use std::path::Path;

/// In-memory flash region implementing [`FlashStorage`].
pub struct ImageFlash {
    origin: u32,
    base: u32,
    sector_size: u32,
    mem: Vec<u8>,
}

impl ImageFlash {
    /// Allocate a buffer covering `region`, widened to whole sectors.
    pub fn new(region: FlashRegion, sector_size: u32) -> Self {
        let origin = region.base / sector_size * sector_size;
        let end = region.end().div_ceil(sector_size) * sector_size;
        Self {
            origin,
            base: region.base,
            sector_size,
            mem: vec![0xFF; (end - origin) as usize],
        }
    }

    fn offset(&self, addr: u32, len: usize) -> bootrx::Result<usize> {
        let off = addr
            .checked_sub(self.origin)
            .ok_or_else(|| Error::Flash(format!("address {addr:#x} below image origin")))?
            as usize;
        if off + len > self.mem.len() {
            return Err(Error::Flash(format!(
                "write of {len} bytes at {addr:#x} leaves the image"
            )));
        }
        Ok(off)
    }

    /// Save the first `len` received bytes to `path`.
    pub fn save(&self, path: &Path, len: u32) -> Result<()> {
        let start = (self.base - self.origin) as usize;
        let image = &self.mem[start..start + len as usize];
        fs::write(path, image).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

impl FlashStorage for ImageFlash {
    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn erase(&mut self, sector_addr: u32) -> bootrx::Result<()> {
        let off = self.offset(sector_addr, self.sector_size as usize)?;
        self.mem[off..off + self.sector_size as usize].fill(0xFF);
        Ok(())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> bootrx::Result<()> {
        let off = self.offset(addr, data.len())?;
        self.mem[off..off + data.len()].copy_from_slice(data);
        Ok(())
    }
}
