//! Error types for the import pipeline

use thiserror::Error;

use crate::types::{ImportStatus, TargetDatabase};

/// File could not be turned into a `ParsedFile`
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unsupported file format")]
    UnsupportedFormat,

    #[error("Empty spreadsheet")]
    EmptySpreadsheet,

    #[error("File has no header row")]
    MissingHeaders,

    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the import workflow can surface to the user
#[derive(Debug, Error)]
pub enum ImportError {
    /// Rejected by the intake checks before parsing
    #[error("File rejected: {0}")]
    FileRejected(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The dry run itself could not run; no row errors are trusted
    #[error("Validation failed: {0}")]
    ValidationTransport(String),

    /// A chunk failed; earlier chunks stay imported
    #[error(
        "Upload failed at chunk {} of {total_chunks}: {reason} ({chunks_succeeded} chunk(s), {rows_succeeded} row(s) already imported)",
        .chunk_index + 1
    )]
    UploadChunk {
        chunk_index: usize,
        total_chunks: usize,
        chunks_succeeded: usize,
        rows_succeeded: usize,
        reason: String,
    },

    /// Cancelled between chunks; earlier chunks stay imported
    #[error(
        "Upload cancelled before chunk {} of {total_chunks} ({chunks_succeeded} chunk(s), {rows_succeeded} row(s) already imported)",
        .next_chunk + 1
    )]
    UploadCancelled {
        next_chunk: usize,
        total_chunks: usize,
        chunks_succeeded: usize,
        rows_succeeded: usize,
    },

    /// Resume point lies past the last chunk of the loaded file
    #[error(
        "Cannot resume at chunk {}: the file only has {total_chunks} chunk(s)",
        .resume_from + 1
    )]
    ResumeOutOfRange {
        resume_from: usize,
        total_chunks: usize,
    },

    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: ImportStatus,
        action: &'static str,
    },

    #[error("No loader template columns known for {0}")]
    NoLoaderSchema(TargetDatabase),
}

impl ImportError {
    /// Chunk to resume from when the error left a partial import behind
    pub fn resume_point(&self) -> Option<usize> {
        match self {
            ImportError::UploadChunk { chunk_index, .. } => Some(*chunk_index),
            ImportError::UploadCancelled { next_chunk, .. } => Some(*next_chunk),
            _ => None,
        }
    }

    /// Whether some rows were persisted before the failure
    pub fn is_partial_import(&self) -> bool {
        match self {
            ImportError::UploadChunk { chunks_succeeded, .. }
            | ImportError::UploadCancelled { chunks_succeeded, .. } => *chunks_succeeded > 0,
            _ => false,
        }
    }
}

/// Adapter record could not be mapped to or from the uniform forms
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Invalid {entity} record for {target}: {source}")]
    InvalidRecord {
        entity: &'static str,
        target: TargetDatabase,
        #[source]
        source: serde_json::Error,
    },

    #[error("{field} must be numeric for {target}, got '{value}'")]
    NonNumericId {
        field: &'static str,
        target: TargetDatabase,
        value: String,
    },

    #[error("{field} is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_messages() {
        assert_eq!(ParseError::UnsupportedFormat.to_string(), "Unsupported file format");
        assert_eq!(ParseError::EmptySpreadsheet.to_string(), "Empty spreadsheet");
    }

    #[test]
    fn test_upload_chunk_error_references_one_based_chunk() {
        let err = ImportError::UploadChunk {
            chunk_index: 1,
            total_chunks: 3,
            chunks_succeeded: 1,
            rows_succeeded: 500,
            reason: "server responded with 500".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("chunk 2 of 3"), "{}", msg);
        assert!(msg.contains("500 row(s) already imported"), "{}", msg);
        assert_eq!(err.resume_point(), Some(1));
        assert!(err.is_partial_import());
    }

    #[test]
    fn test_first_chunk_failure_is_not_partial() {
        let err = ImportError::UploadCancelled {
            next_chunk: 0,
            total_chunks: 2,
            chunks_succeeded: 0,
            rows_succeeded: 0,
        };
        assert!(!err.is_partial_import());
        assert_eq!(err.resume_point(), Some(0));
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = ImportError::InvalidTransition {
            from: ImportStatus::ValidatedWithErrors,
            action: "upload",
        };
        assert_eq!(err.to_string(), "Cannot upload while validated_with_errors");
    }
}
