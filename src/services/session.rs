//! Import session state machine
//!
//! One status field, guarded transitions. The session owns the parsed file,
//! the dry run errors, upload progress and the resume point left behind by a
//! partial upload. It performs no I/O; `services::workflow` drives it.

use uuid::Uuid;

use crate::error::ImportError;
use crate::services::uploader::{chunk_count, progress_percent};
use crate::types::{ImportStatus, ParsedFile, ValidationError, ValidationOutcome};

/// Parsed file plus the name it was selected under
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub parsed: ParsedFile,
}

/// Where the last upload run stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub message: String,
    /// First chunk not yet imported
    pub resume_from: usize,
    pub total_chunks: usize,
    pub partial: bool,
}

#[derive(Debug)]
pub struct ImportSession {
    id: Uuid,
    status: ImportStatus,
    file: Option<LoadedFile>,
    errors: Vec<ValidationError>,
    progress: f64,
    resume_from: usize,
    last_failure: Option<UploadFailure>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: ImportStatus::Idle,
            file: None,
            errors: Vec::new(),
            progress: 0.0,
            resume_from: 0,
            last_failure: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> ImportStatus {
        self.status
    }

    pub fn file(&self) -> Option<&LoadedFile> {
        self.file.as_ref()
    }

    pub fn parsed(&self) -> Option<&ParsedFile> {
        self.file.as_ref().map(|f| &f.parsed)
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn resume_from(&self) -> usize {
        self.resume_from
    }

    pub fn last_failure(&self) -> Option<&UploadFailure> {
        self.last_failure.as_ref()
    }

    fn guard(&self, action: &'static str, allowed: &[ImportStatus]) -> Result<(), ImportError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(ImportError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }

    // ==========================================================================
    // Transitions
    // ==========================================================================

    /// Any state -> idle. Discards file, errors, progress and resume point.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Any state -> loaded. Always starts from a fresh session.
    pub fn load(&mut self, name: impl Into<String>, parsed: ParsedFile) {
        self.clear();
        self.file = Some(LoadedFile {
            name: name.into(),
            parsed,
        });
        self.status = ImportStatus::Loaded;
    }

    /// loaded | validated_* -> validating
    pub fn begin_validation(&mut self) -> Result<(), ImportError> {
        self.guard(
            "validate",
            &[
                ImportStatus::Loaded,
                ImportStatus::ValidatedClean,
                ImportStatus::ValidatedWithErrors,
            ],
        )?;
        self.errors.clear();
        self.status = ImportStatus::Validating;
        Ok(())
    }

    /// validating -> validated_clean | validated_with_errors
    pub fn finish_validation(&mut self, errors: Vec<ValidationError>) -> Result<ValidationOutcome, ImportError> {
        self.guard("finish validation", &[ImportStatus::Validating])?;

        if errors.is_empty() {
            self.status = ImportStatus::ValidatedClean;
            Ok(ValidationOutcome::Clean)
        } else {
            self.errors = errors.clone();
            self.status = ImportStatus::ValidatedWithErrors;
            Ok(ValidationOutcome::RowErrors(errors))
        }
    }

    /// validating -> loaded, no error list kept
    pub fn abort_validation(&mut self) -> Result<(), ImportError> {
        self.guard("abort validation", &[ImportStatus::Validating])?;
        self.errors.clear();
        self.status = ImportStatus::Loaded;
        Ok(())
    }

    /// Set the chunk the next upload starts from (e.g. after a previous
    /// partial import of the same file)
    pub fn set_resume_point(&mut self, chunk: usize) -> Result<(), ImportError> {
        self.guard(
            "set resume point",
            &[
                ImportStatus::Loaded,
                ImportStatus::ValidatedClean,
                ImportStatus::ValidatedWithErrors,
            ],
        )?;
        self.resume_from = chunk;
        Ok(())
    }

    /// validated_clean -> uploading. Returns the chunk to start from.
    /// A resume point past the last chunk is refused and the state is kept.
    pub fn begin_upload(&mut self, chunk_size: usize) -> Result<usize, ImportError> {
        self.guard("upload", &[ImportStatus::ValidatedClean])?;

        let rows = self.parsed().map(|p| p.row_count()).unwrap_or(0);
        let total = chunk_count(rows, chunk_size);
        let start = self.resume_from;
        if start > 0 && start >= total {
            return Err(ImportError::ResumeOutOfRange {
                resume_from: start,
                total_chunks: total,
            });
        }

        self.progress = if start == 0 { 0.0 } else { progress_percent(start, total) };
        self.last_failure = None;
        self.status = ImportStatus::Uploading;
        Ok(start)
    }

    /// Record progress while uploading. Progress never decreases.
    pub fn record_progress(&mut self, percent: f64) -> Result<(), ImportError> {
        self.guard("record progress", &[ImportStatus::Uploading])?;
        self.progress = self.progress.max(percent.clamp(0.0, 100.0));
        Ok(())
    }

    /// uploading -> complete
    pub fn finish_upload(&mut self) -> Result<(), ImportError> {
        self.guard("finish upload", &[ImportStatus::Uploading])?;
        self.progress = 100.0;
        self.resume_from = 0;
        self.status = ImportStatus::Complete;
        Ok(())
    }

    /// uploading -> loaded. A fresh clean dry run is needed before the next
    /// upload, which resumes from the first chunk not yet imported.
    pub fn fail_upload(&mut self, error: &ImportError) -> Result<(), ImportError> {
        self.guard("fail upload", &[ImportStatus::Uploading])?;

        let total_chunks = match error {
            ImportError::UploadChunk { total_chunks, .. }
            | ImportError::UploadCancelled { total_chunks, .. } => *total_chunks,
            _ => 0,
        };
        if let Some(resume_from) = error.resume_point() {
            self.resume_from = resume_from;
        }
        self.last_failure = Some(UploadFailure {
            message: error.to_string(),
            resume_from: self.resume_from,
            total_chunks,
            partial: error.is_partial_import(),
        });
        self.status = ImportStatus::Loaded;
        Ok(())
    }
}
