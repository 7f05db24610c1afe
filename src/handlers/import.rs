//! Validate and import commands

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::handlers::ConsoleSink;
use crate::services::loader_client::LoaderApi;
use crate::services::workflow::{ImportWorkflow, WorkflowSettings};
use crate::types::{TargetDatabase, ValidationError, ValidationOutcome};

/// Row errors listed before the rest are summarized
const MAX_LISTED_ERRORS: usize = 10;

/// Human readable error listing, truncated after `MAX_LISTED_ERRORS`
pub fn format_row_errors(errors: &[ValidationError]) -> Vec<String> {
    let mut lines: Vec<String> = errors
        .iter()
        .take(MAX_LISTED_ERRORS)
        .map(|e| format!("Row {}: {}", e.row, e.error))
        .collect();

    if errors.len() > MAX_LISTED_ERRORS {
        lines.push(format!("+ {} more errors", errors.len() - MAX_LISTED_ERRORS));
    }
    lines
}

fn print_row_errors(errors: &[ValidationError]) {
    for line in format_row_errors(errors) {
        println!("    {}", line);
    }
}

fn new_workflow(config: &Config, api: Arc<dyn LoaderApi>, target: TargetDatabase) -> ImportWorkflow<ConsoleSink> {
    ImportWorkflow::new(api, target, WorkflowSettings::from(config), ConsoleSink::default())
}

/// Parse and dry-run a file. Returns `true` when every row is valid.
pub async fn handle_validate(
    config: &Config,
    api: Arc<dyn LoaderApi>,
    target: TargetDatabase,
    file: &Path,
) -> Result<bool> {
    info!("Validating {} against {} ({})", file.display(), target, api.name());
    let mut workflow = new_workflow(config, api, target);

    workflow.load_file(file)?;
    match workflow.dry_run().await? {
        ValidationOutcome::Clean => Ok(true),
        ValidationOutcome::RowErrors(errors) => {
            print_row_errors(&errors);
            Ok(false)
        }
    }
}

/// Parse, dry-run and upload a file. Nothing is uploaded unless the dry run is clean.
pub async fn handle_import(
    config: &Config,
    api: Arc<dyn LoaderApi>,
    target: TargetDatabase,
    file: &Path,
    resume_from: Option<usize>,
    cancel: &CancellationToken,
) -> Result<()> {
    info!("Importing {} into {} ({})", file.display(), target, api.name());
    let mut workflow = new_workflow(config, api, target);

    workflow.load_file(file)?;
    if let Some(chunk) = resume_from {
        workflow.resume_from(chunk)?;
    }

    if let ValidationOutcome::RowErrors(errors) = workflow.dry_run().await? {
        print_row_errors(&errors);
        bail!("{} rows failed validation, nothing was imported", errors.len());
    }

    let report = workflow.upload(cancel).await?;
    info!(
        "Import finished: {} rows in {} of {} chunks ({} ms)",
        report.rows_uploaded,
        report.chunks_uploaded,
        report.total_chunks,
        report.duration_ms
    );
    Ok(())
}
