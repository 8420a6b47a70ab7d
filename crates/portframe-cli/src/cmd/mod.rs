use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use portframe_core::constants::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS};
use portframe_core::{ChecksumKind, ChecksumRequest, DispatcherConfig};
use portframe_serial::SerialSettings;
use tracing::debug;

use crate::output::OutputFormat;

pub mod checksum;
pub mod monitor;
pub mod send;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a port and print every packet and event.
    Monitor(MonitorArgs),
    /// Send one payload, optionally printing replies.
    Send(SendArgs),
    /// Append or verify a checksum trailer offline.
    Checksum(ChecksumCmdArgs),
}

pub fn run(command: Command, format: OutputFormat) -> Result<()> {
    match command {
        Command::Monitor(args) => monitor::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Checksum(args) => checksum::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct PortArgs {
    /// Serial device, e.g. /dev/ttyUSB0 or COM3.
    #[arg(long, short = 'p', env = "PORTFRAME_PORT")]
    pub port: String,
    /// Line speed.
    #[arg(long, short = 'b', default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Maximum time a single read may block.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_READ_TIMEOUT_MS)]
    pub read_timeout_ms: u64,
}

impl PortArgs {
    pub fn settings(&self) -> SerialSettings {
        SerialSettings {
            read_timeout_ms: self.read_timeout_ms,
            ..SerialSettings::new(self.port.clone()).with_baud_rate(self.baud)
        }
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ChecksumArgs {
    /// Trailer algorithm: none, crc16, xor or sum.
    #[arg(long = "checksum", value_name = "KIND", default_value = "none")]
    pub kind: ChecksumKind,
    /// Trailer length in bytes.
    #[arg(long = "trailer", value_name = "N", default_value_t = 2)]
    pub trailer_len: usize,
}

impl ChecksumArgs {
    pub fn request(&self) -> ChecksumRequest {
        ChecksumRequest::new(self.kind, self.trailer_len)
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Dispatcher configuration (JSON).
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Exit after N packets.
    #[arg(long)]
    pub count: Option<usize>,
    /// Delay between polls.
    #[arg(long, value_name = "MS", default_value_t = 10)]
    pub interval_ms: u64,
    /// Drop inbound packets whose trailer does not verify.
    #[command(flatten)]
    pub verify: ChecksumArgs,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct PayloadArgs {
    /// Payload as hex digits; spaces and dashes are ignored.
    #[arg(long)]
    pub hex: Option<String>,
    /// Payload as text.
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub port: PortArgs,
    #[command(flatten)]
    pub payload: PayloadArgs,
    #[command(flatten)]
    pub checksum: ChecksumArgs,
    /// Keep reading for MS milliseconds and print replies.
    #[arg(long, value_name = "MS")]
    pub wait_ms: Option<u64>,
    /// Dispatcher configuration (JSON) used for replies.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ChecksumCmdArgs {
    /// Payload as hex digits.
    #[arg(long)]
    pub hex: String,
    #[command(flatten)]
    pub checksum: ChecksumArgs,
    /// Treat the input as payload plus trailer and check it.
    #[arg(long)]
    pub verify: bool,
}

/// Load a dispatcher configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<DispatcherConfig> {
    let Some(path) = path else {
        return Ok(DispatcherConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let config: DispatcherConfig = serde_json::from_str(&text)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;

    debug!(
        "Loaded {} with {} event rules",
        path.display(),
        config.events.len()
    );
    Ok(config)
}
