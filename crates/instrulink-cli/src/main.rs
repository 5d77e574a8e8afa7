//! `instrulink` - one command, one bounded reply

mod cli;
mod logger;

use anyhow::Context;
use clap::Parser;
use instrulink_core::prelude::*;
use instrulink_core::protocol::list_ports;
use std::process::ExitCode;

use cli::{failure_exit_code, reply_exit_code, Cli, Commands, ExchangeArgs};

/// Exit code for host-side failures (bad profile file, output errors)
const HOST_FAILURE: u8 = 10;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let result = match cli.command {
        Commands::Ports => {
            print_ports();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Exchange(args) => exchange(args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(HOST_FAILURE)
        }
    }
}

fn print_ports() {
    let ports = list_ports();
    if ports.is_empty() {
        println!("No serial ports found");
        return;
    }
    for port in ports {
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => println!(
                "{}\t{:04x}:{:04x}\t{}",
                port.name,
                vid,
                pid,
                port.product.unwrap_or_default()
            ),
            _ => println!("{}", port.name),
        }
    }
}

async fn exchange(args: ExchangeArgs) -> anyhow::Result<ExitCode> {
    let profile = args.resolve_profile()?;
    if let Some(path) = &args.save_profile {
        profile
            .save(path)
            .with_context(|| format!("failed to save profile {}", path.display()))?;
        tracing::info!("Saved profile to {}", path.display());
    }

    let engine = if args.demo {
        ExchangeEngine::demo()
    } else {
        ExchangeEngine::serial()
    };
    let session = ExchangeSession::new(engine);
    tracing::debug!("Exchanging with {}", profile.link);

    let exchange = session.perform_profile(&profile);
    tokio::pin!(exchange);
    let finished = tokio::select! {
        outcome = &mut exchange => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };
    let outcome = match finished {
        Some(outcome) => outcome,
        None => {
            tracing::warn!("Interrupted, cancelling exchange");
            session.shutdown();
            exchange.await
        }
    };

    match outcome {
        Ok(reply) => {
            if args.json {
                println!("{}", serde_json::to_string(&reply)?);
            } else {
                println!("{reply}");
            }
            Ok(reply_exit_code(&reply))
        }
        Err(e) => {
            if args.json {
                let failure = serde_json::json!({ "kind": e.kind(), "detail": e.to_string() });
                println!("{failure}");
            } else {
                eprintln!("{e}");
            }
            Ok(ExitCode::from(failure_exit_code(e.kind())))
        }
    }
}
