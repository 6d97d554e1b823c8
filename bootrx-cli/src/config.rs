//! Partition table configuration.
//!
//! The receiver only ever writes inside a declared partition; the
//! table says where those live. It is loaded from a TOML file or
//! falls back to a built-in two-partition layout (application plus
//! OTA staging), e.g.:
//!
//! ```toml
//! [[partition]]
//! name = "os"
//! base = 0x10000
//! length = 0x100000
//! sector_size = 4096
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

fn default_sector_size() -> u32 {
    4096
}

/// One writable flash partition.
#[derive(Debug, Clone, Deserialize)]
pub struct Partition {
    /// Partition name, for operator messages only.
    pub name: String,
    /// First address of the partition.
    pub base: u32,
    /// Partition length in bytes.
    pub length: u32,
    /// Erase granularity of the underlying flash.
    #[serde(default = "default_sector_size")]
    pub sector_size: u32,
}

impl Partition {
    /// Whether `addr` lies inside this partition.
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.base && addr < self.base + self.length
    }
}

/// The full partition table.
#[derive(Debug, Clone, Deserialize)]
pub struct PartitionTable {
    /// Declared partitions.
    #[serde(default)]
    pub partition: Vec<Partition>,
}

impl Default for PartitionTable {
    fn default() -> Self {
        Self {
            partition: vec![
                Partition {
                    name: "os".into(),
                    base: 0x0001_0000,
                    length: 0x0010_0000,
                    sector_size: default_sector_size(),
                },
                Partition {
                    name: "ota".into(),
                    base: 0x0011_0000,
                    length: 0x0010_0000,
                    sector_size: default_sector_size(),
                },
            ],
        }
    }
}

impl PartitionTable {
    /// Load a partition table from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading partition table {}", path.display()))?;
        let table: Self = toml::from_str(&text)
            .with_context(|| format!("parsing partition table {}", path.display()))?;
        Ok(table)
    }

    /// Find the partition containing `addr`, if any.
    pub fn find(&self, addr: u32) -> Option<&Partition> {
        self.partition.iter().find(|p| p.contains(addr))
    }
}
