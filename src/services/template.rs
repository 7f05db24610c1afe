//! Example file generator for the bulk loader

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

/// Placeholder value for a column in the example row
pub fn placeholder(field: &str) -> String {
    format!("example_{}", field)
}

/// Render a header line plus one example row for `columns`
pub fn render_template<S: AsRef<str>>(columns: &[S]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|c| c.as_ref()))?;
    writer.write_record(columns.iter().map(|c| placeholder(c.as_ref())))?;

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush template: {}", e.error()))
}

/// Write the template into `out_dir` under `filename`, returning the full path
pub fn write_template<S: AsRef<str>>(out_dir: &Path, filename: &str, columns: &[S]) -> Result<PathBuf> {
    let content = render_template(columns)?;
    let path = out_dir.join(filename);

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write template to {}", path.display()))?;

    info!("Template with {} columns written to {}", columns.len(), path.display());
    Ok(path)
}
