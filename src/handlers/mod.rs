//! Command handlers

pub mod import;
pub mod normalize;
pub mod template;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cli::Command;
use crate::config::Config;
use crate::services::loader_client::LoaderApi;
use crate::services::workflow::EventSink;
use crate::types::{EventLevel, WorkflowEvent};

/// Prints workflow events for the operator and mirrors them into the log
#[derive(Debug, Default)]
pub struct ConsoleSink {
    last_progress: Option<u64>,
}

impl EventSink for ConsoleSink {
    fn emit(&mut self, event: WorkflowEvent) {
        match event.level {
            EventLevel::Error => error!(session = %event.session_id, status = %event.status, "{}", event.message),
            EventLevel::Warning => warn!(session = %event.session_id, status = %event.status, "{}", event.message),
            EventLevel::Progress => debug!(session = %event.session_id, progress = event.progress, "{}", event.message),
            EventLevel::Info | EventLevel::Success => {
                info!(session = %event.session_id, status = %event.status, "{}", event.message)
            }
        }

        match event.level {
            EventLevel::Progress => {
                let percent = event.progress.floor() as u64;
                if self.last_progress != Some(percent) {
                    self.last_progress = Some(percent);
                    println!("  {:>3}%  {}", percent, event.message);
                }
            }
            EventLevel::Success => println!("✓ {}", event.message),
            EventLevel::Warning => println!("! {}", event.message),
            EventLevel::Error => println!("✗ {}", event.message),
            EventLevel::Info => println!("  {}", event.message),
        }
    }
}

/// Run one CLI command to completion
pub async fn dispatch(
    command: Command,
    config: &Config,
    api: Arc<dyn LoaderApi>,
    cancel: CancellationToken,
) -> Result<ExitCode> {
    match command {
        Command::Template { target, out_dir, columns } => {
            template::handle_template(target, &out_dir, columns)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { target, file } => {
            let clean = import::handle_validate(config, api, target, &file).await?;
            Ok(if clean { ExitCode::SUCCESS } else { ExitCode::from(2) })
        }
        Command::Import { target, file, resume_from } => {
            let resume_from = resume_from.map(|n| (n - 1) as usize);
            import::handle_import(config, api, target, &file, resume_from, &cancel).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Normalize { target, entity, file } => {
            normalize::handle_normalize(target, entity, &file)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Payload { target, entity, file } => {
            normalize::handle_payload(target, entity, &file)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
