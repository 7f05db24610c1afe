//! Bulk loader types: parsed files, rows, chunks and the loader wire format

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single data row as read from the uploaded file.
///
/// Values stay loosely typed (string, number or null) until the backend
/// validates them. `number` is the 1-based position of the row in the parsed
/// file and is never sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(skip)]
    pub number: usize,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawRow {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            fields: Map::new(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.fields.insert(column.into(), value);
    }
}

#[cfg(test)]
impl RawRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Field rendered as text, if present
    pub fn text(&self, column: &str) -> Option<String> {
        match self.fields.get(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Result of parsing an uploaded file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    /// Column names in first-seen order
    pub headers: Vec<String>,
    /// Rows in source order
    pub rows: Vec<RawRow>,
}

impl ParsedFile {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Per-row problem reported by the dry run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// 1-based row number in the original file
    pub row: usize,
    pub error: String,
}

/// A contiguous slice of rows submitted as one upload request
#[derive(Debug, Clone, Copy)]
pub struct UploadChunk<'a> {
    pub rows: &'a [RawRow],
    pub chunk_index: usize,
    pub total_chunks: usize,
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Body of `POST /{db}/loader/upload?dryRun=true`
#[derive(Debug, Serialize)]
pub struct DryRunRequest<'a> {
    pub rows: &'a [RawRow],
}

/// Dry run response; absent or empty `errors` means every row is valid
#[derive(Debug, Default, Deserialize)]
pub struct DryRunResponse {
    #[serde(default)]
    pub errors: Option<Vec<ValidationError>>,
}

impl DryRunResponse {
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors.unwrap_or_default()
    }
}

/// Body of `POST /{db}/loader/upload`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUploadRequest<'a> {
    pub rows: &'a [RawRow],
    pub chunk_index: usize,
    pub total_chunks: usize,
}

impl<'a> From<&UploadChunk<'a>> for ChunkUploadRequest<'a> {
    fn from(chunk: &UploadChunk<'a>) -> Self {
        Self {
            rows: chunk.rows,
            chunk_index: chunk.chunk_index,
            total_chunks: chunk.total_chunks,
        }
    }
}
