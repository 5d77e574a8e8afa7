//! Command line arguments

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use instrulink_core::demo::DEMO_PORT;
use instrulink_core::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;

/// Send one command to a serial instrument and classify its reply
#[derive(Parser, Debug)]
#[command(name = "instrulink", version, about)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List serial ports present on this machine
    Ports,
    /// Perform a single command/response exchange
    Exchange(ExchangeArgs),
}

#[derive(Args, Debug, Default)]
pub struct ExchangeArgs {
    /// Load settings from a JSON profile; other flags override it
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Serial port (e.g. /dev/ttyUSB0, COM3)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// none, odd, even, mark or space
    #[arg(long)]
    pub parity: Option<Parity>,

    /// Data bits (5-8)
    #[arg(long)]
    pub data_bits: Option<u8>,

    /// one, two or one_point_five
    #[arg(long)]
    pub stop_bits: Option<StopBits>,

    /// none, x_on_x_off, request_to_send or request_to_send_x_on_x_off
    #[arg(long)]
    pub handshake: Option<Handshake>,

    /// Seconds to wait for the reply
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Command text; CR LF is appended
    #[arg(short, long)]
    pub command: Option<String>,

    /// Talk to the built-in simulated instrument
    #[arg(long)]
    pub demo: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the effective settings to this profile file
    #[arg(long)]
    pub save_profile: Option<PathBuf>,
}

impl ExchangeArgs {
    /// Profile file (if any) with command line overrides applied
    pub fn resolve_profile(&self) -> anyhow::Result<ExchangeProfile> {
        let mut profile = match &self.profile {
            Some(path) => ExchangeProfile::load(path)
                .with_context(|| format!("failed to load profile {}", path.display()))?,
            None => ExchangeProfile::default(),
        };

        let link = &mut profile.link;
        if let Some(port) = &self.port {
            link.port_name = port.clone();
        } else if self.demo && link.port_name.is_empty() {
            link.port_name = DEMO_PORT.to_string();
        }
        if let Some(baud) = self.baud {
            link.baud_rate = baud;
        }
        if let Some(parity) = self.parity {
            link.parity = parity;
        }
        if let Some(bits) = self.data_bits {
            link.data_bits = bits;
        }
        if let Some(stop_bits) = self.stop_bits {
            link.stop_bits = stop_bits;
        }
        if let Some(handshake) = self.handshake {
            link.handshake = handshake;
        }
        if let Some(timeout) = self.timeout {
            profile.timeout_secs = timeout;
        }
        if self.command.is_some() {
            profile.command = self.command.clone();
        }

        Ok(profile)
    }
}

/// Process exit code for a reply
pub fn reply_exit_code(reply: &Reply) -> ExitCode {
    if reply.is_rejected() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Process exit code for a failure
pub fn failure_exit_code(kind: FailureKind) -> u8 {
    match kind {
        FailureKind::InvalidConfig => 2,
        FailureKind::AccessDenied => 3,
        FailureKind::Timeout => 4,
        FailureKind::Cancelled => 5,
        FailureKind::Io => 6,
    }
}
