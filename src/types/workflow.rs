//! Import workflow status and user-facing events

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an import session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// No file selected
    Idle,
    /// File parsed, not validated yet (also the landing state after a failure)
    Loaded,
    /// Dry run in flight
    Validating,
    /// Dry run returned no errors; upload allowed
    ValidatedClean,
    /// Dry run returned row errors; upload blocked
    ValidatedWithErrors,
    /// Chunks being dispatched
    Uploading,
    /// Every chunk imported
    Complete,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Idle => "idle",
            ImportStatus::Loaded => "loaded",
            ImportStatus::Validating => "validating",
            ImportStatus::ValidatedClean => "validated_clean",
            ImportStatus::ValidatedWithErrors => "validated_with_errors",
            ImportStatus::Uploading => "uploading",
            ImportStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Success,
    Warning,
    Error,
    Progress,
}

/// One notification emitted on a workflow transition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEvent {
    pub session_id: Uuid,
    pub level: EventLevel,
    pub status: ImportStatus,
    /// Upload progress, 0-100
    pub progress: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Cumulative upload progress after a chunk resolves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadProgress {
    /// Chunks imported so far, including ones from a previous run when resuming
    pub completed_chunks: usize,
    pub total_chunks: usize,
    /// 0-based index of the chunk that just succeeded
    pub chunk_index: usize,
    pub percent: f64,
}

/// Summary of a finished upload run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub total_chunks: usize,
    /// First chunk dispatched in this run
    pub resumed_from: usize,
    pub chunks_uploaded: usize,
    pub rows_uploaded: usize,
    pub duration_ms: u64,
}

/// What the dry run concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Clean,
    RowErrors(Vec<super::ValidationError>),
}
