//! Sales Loader - bulk data ingestion for the sales console databases
//!
//! Parses CSV/spreadsheet files, dry-runs them against the REST backend and
//! uploads validated rows in chunks.

mod cli;
mod config;
mod error;
mod handlers;
mod services;
mod types;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load .env before reading LOGS_DIR / RUST_LOG
    dotenvy::dotenv().ok();

    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "sales-loader.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // stdout carries command output, so console logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sales_loader=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config = config::Config::from_env()?
        .with_overrides(cli.api_url.as_deref(), cli.chunk_size)?;
    info!("Configuration loaded (api: {}, chunk size: {})", config.api_base_url, config.chunk_size);

    let api = services::loader_client::create_loader_api(&config)?;

    // Ctrl-C stops the upload before the next chunk is dispatched; a second one quits
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match on_interrupt(&ctrl_c) {
                Interrupt::Cancel => {
                    warn!("Interrupt received, stopping after the current chunk (Ctrl-C again to quit)")
                }
                Interrupt::Exit => {
                    error!("Second interrupt received, exiting now");
                    std::process::exit(130);
                }
            }
        }
    });

    match handlers::dispatch(cli.command, &config, api, cancel).await {
        Ok(code) => Ok(code),
        Err(e) => {
            error!("{:#}", e);
            Err(e)
        }
    }
}

/// What a Ctrl-C press does
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    Cancel,
    Exit,
}

fn on_interrupt(cancel: &CancellationToken) -> Interrupt {
    if cancel.is_cancelled() {
        Interrupt::Exit
    } else {
        cancel.cancel();
        Interrupt::Cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_interrupt_cancels_second_exits() {
        let cancel = CancellationToken::new();
        let child = cancel.clone();

        assert_eq!(on_interrupt(&cancel), Interrupt::Cancel);
        assert!(child.is_cancelled());
        assert_eq!(on_interrupt(&cancel), Interrupt::Exit);
        assert_eq!(on_interrupt(&cancel), Interrupt::Exit);
    }
}
