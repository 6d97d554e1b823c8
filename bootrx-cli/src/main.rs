//! bootrx CLI - receive a firmware image over YMODEM.
//!
//! Plays the role of a second-stage boot loader on a host machine:
//! it invites a YMODEM sender on a serial port, validates the target
//! flash address against a partition table, streams the image through
//! the receive engine into a flash-image buffer, and saves the result
//! to a file.

use anyhow::{Context, Result, bail};
use bootrx::{FlashRegion, NativePort, YmodemReceiver, parse_ascii_uint};
use clap::Parser;
use dialoguer::Input;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod image;

use config::PartitionTable;
use image::ImageFlash;

/// bootrx - receive a firmware image over YMODEM into a flash image.
///
/// Environment variables:
///   BOOTRX_PORT        - Default serial port
///   BOOTRX_BAUD        - Default baud rate (default: 115200)
///   BOOTRX_PARTITIONS  - Default partition table file
#[derive(Parser)]
#[command(name = "bootrx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial port to receive on (e.g. /dev/ttyUSB0, COM3).
    #[arg(short, long, env = "BOOTRX_PORT")]
    port: String,

    /// Baud rate.
    #[arg(short, long, default_value = "115200", env = "BOOTRX_BAUD")]
    baud: u32,

    /// Partition table file (TOML); built-in table when omitted.
    #[arg(long, env = "BOOTRX_PARTITIONS")]
    partitions: Option<PathBuf>,

    /// Flash address to write to, decimal or 0x-prefixed hex.
    /// Prompted for interactively when omitted.
    #[arg(short, long)]
    address: Option<String>,

    /// Destination file for the received image.
    #[arg(short, long, default_value = "received.bin")]
    out: PathBuf,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    let table = match &cli.partitions {
        Some(path) => PartitionTable::from_file(path)?,
        None => PartitionTable::default(),
    };

    for part in &table.partition {
        info!(
            "partition {:<8} address {:#010x}, length {:#x}",
            part.name, part.base, part.length
        );
    }
    info!("only addresses inside a declared partition are writable");

    let address = match &cli.address {
        Some(text) => text.clone(),
        None => Input::new()
            .with_prompt("Flash address")
            .interact_text()
            .context("reading flash address")?,
    };

    let addr = parse_ascii_uint(address.trim().as_bytes());
    if addr == 0 {
        bail!("invalid flash address: {address}");
    }
    let part = table
        .find(addr)
        .with_context(|| format!("address {addr:#x} is outside every partition"))?;
    debug!("address {addr:#x} falls in partition {}", part.name);

    let region = FlashRegion {
        base: addr,
        max_len: part.length,
    };
    let mut flash = ImageFlash::new(region, part.sector_size);
    let mut port = NativePort::open(&cli.port, cli.baud)
        .with_context(|| format!("opening serial port {}", cli.port))?;
    port.clear_buffers()
        .context("draining stale serial data")?;

    info!("please start the YMODEM sender (Ctrl-C on its console aborts)");

    let bar = ProgressBar::hidden();
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes} {bytes_per_sec}")
            .context("progress template")?,
    );

    let result = YmodemReceiver::new(&mut port, &mut flash, region).receive(|current, total| {
        if bar.is_hidden() && total > 0 {
            bar.set_length(u64::from(total));
            bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        }
        bar.set_position(u64::from(current));
    });
    bar.finish_and_clear();

    match result {
        Ok(received) => {
            flash.save(&cli.out, received.length)?;
            info!(
                "received {} : {:#x} bytes at {addr:#x}, saved to {}",
                if received.name.is_empty() {
                    "<unnamed>"
                } else {
                    &received.name
                },
                received.length,
                cli.out.display()
            );
            Ok(())
        },
        Err(e @ bootrx::Error::FileTooLarge { .. }) => {
            bail!("{e} - nothing saved");
        },
        Err(e) => Err(e).context("receive failed"),
    }
}
