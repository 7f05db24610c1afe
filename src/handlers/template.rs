//! Template download

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::ImportError;
use crate::services::template::write_template;
use crate::types::TargetDatabase;

/// Columns for the template: explicit ones win, otherwise the target's loader schema
fn template_columns(target: TargetDatabase, columns: Option<Vec<String>>) -> Result<Vec<String>, ImportError> {
    match columns {
        Some(columns) => Ok(columns
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()),
        None => target
            .loader_columns()
            .map(|cols| cols.iter().map(|c| c.to_string()).collect())
            .ok_or(ImportError::NoLoaderSchema(target)),
    }
}

pub fn handle_template(target: TargetDatabase, out_dir: &Path, columns: Option<Vec<String>>) -> Result<PathBuf> {
    let columns = template_columns(target, columns)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let path = write_template(out_dir, &target.template_filename(), &columns)?;
    println!("Template downloaded: {}", path.display());
    Ok(path)
}
