//! Import workflow controller
//!
//! Validate-then-commit: a file is parsed, the whole file is dry-run against
//! the backend in one round trip, and only a clean dry run unlocks the chunked
//! upload. Every transition emits a `WorkflowEvent`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::ImportError;
use crate::services::intake::FileIntake;
use crate::services::loader_client::LoaderApi;
use crate::services::parser;
use crate::services::session::ImportSession;
use crate::services::uploader::{ChunkedUploader, DEFAULT_CHUNK_SIZE};
use crate::types::{
    EventLevel, ImportStatus, TargetDatabase, UploadReport, ValidationOutcome,
    WorkflowEvent,
};

/// Receiver of workflow notifications
pub trait EventSink {
    fn emit(&mut self, event: WorkflowEvent);
}

impl EventSink for Vec<WorkflowEvent> {
    fn emit(&mut self, event: WorkflowEvent) {
        self.push(event);
    }
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<WorkflowEvent> {
    fn emit(&mut self, event: WorkflowEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.send(event);
    }
}

/// Tunables for one workflow instance
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub chunk_size: usize,
    pub request_timeout: Duration,
    pub max_file_bytes: u64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout: Duration::from_secs(30),
            max_file_bytes: crate::services::intake::DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl From<&Config> for WorkflowSettings {
    fn from(config: &Config) -> Self {
        Self {
            chunk_size: config.chunk_size,
            request_timeout: config.request_timeout,
            max_file_bytes: config.max_file_bytes,
        }
    }
}

/// Drives one import session against one target database
pub struct ImportWorkflow<S: EventSink> {
    api: Arc<dyn LoaderApi>,
    target: TargetDatabase,
    settings: WorkflowSettings,
    intake: FileIntake,
    session: ImportSession,
    sink: S,
}

impl<S: EventSink> ImportWorkflow<S> {
    pub fn new(api: Arc<dyn LoaderApi>, target: TargetDatabase, settings: WorkflowSettings, sink: S) -> Self {
        let intake = FileIntake::new(settings.max_file_bytes);
        Self {
            api,
            target,
            settings,
            intake,
            session: ImportSession::new(),
            sink,
        }
    }

    pub fn session(&self) -> &ImportSession {
        &self.session
    }

    pub fn status(&self) -> ImportStatus {
        self.session.status()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn notify(&mut self, level: EventLevel, message: impl Into<String>) {
        let event = WorkflowEvent {
            session_id: self.session.id(),
            level,
            status: self.session.status(),
            progress: self.session.progress(),
            message: message.into(),
            timestamp: Utc::now(),
        };
        self.sink.emit(event);
    }

    /// Drop the current file and return to idle
    pub fn clear(&mut self) {
        self.session.clear();
        self.notify(EventLevel::Info, "File cleared");
    }

    /// Accept and parse a file. Any previous session is discarded first.
    /// Returns the number of data rows found.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ImportError> {
        if self.session.status() != ImportStatus::Idle {
            info!("Discarding session {} before loading {}", self.session.id(), path.display());
        }
        self.session.clear();

        let parsed = self
            .intake
            .check(path)
            .and_then(|_| parser::parse_file(path).map_err(ImportError::from));

        match parsed {
            Ok(parsed) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let rows = parsed.row_count();
                self.session.load(name, parsed);

                if rows == 0 {
                    self.notify(EventLevel::Warning, "File parsed: 0 rows found");
                } else {
                    self.notify(EventLevel::Success, format!("File parsed: {} rows found", rows));
                }
                Ok(rows)
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                self.notify(EventLevel::Error, format!("Failed to parse file: {}", e));
                Err(e)
            }
        }
    }

    /// Resume the next upload from `chunk` (0-based), for a file that was
    /// partially imported in an earlier run
    pub fn resume_from(&mut self, chunk: usize) -> Result<(), ImportError> {
        self.session.set_resume_point(chunk)?;
        if chunk > 0 {
            self.notify(
                EventLevel::Info,
                format!("Upload will resume at chunk {}", chunk + 1),
            );
        }
        Ok(())
    }

    /// Validate every row with a single dry run request
    pub async fn dry_run(&mut self) -> Result<ValidationOutcome, ImportError> {
        if let Err(e) = self.session.begin_validation() {
            self.notify(EventLevel::Error, e.to_string());
            return Err(e);
        }
        let (name, rows) = self
            .session
            .file()
            .map(|f| (f.name.clone(), f.parsed.row_count()))
            .unwrap_or_default();
        self.notify(EventLevel::Info, format!("Validating {} rows from {}", rows, name));

        let response = {
            let rows = self.session.parsed().map(|p| p.rows.as_slice()).unwrap_or(&[]);
            tokio::time::timeout(self.settings.request_timeout, self.api.dry_run(self.target, rows)).await
        };

        let errors = match response {
            Ok(Ok(errors)) => errors,
            Ok(Err(e)) => return Err(self.validation_failed(format!("{:#}", e))),
            Err(_) => {
                let reason = format!("timed out after {}s", self.settings.request_timeout.as_secs_f64());
                return Err(self.validation_failed(reason));
            }
        };

        let outcome = self.session.finish_validation(errors)?;
        match &outcome {
            ValidationOutcome::Clean => {
                info!("Dry run against {} passed for {} rows", self.target, rows);
                self.notify(EventLevel::Success, "All rows validated successfully!");
            }
            ValidationOutcome::RowErrors(errors) => {
                info!("Dry run against {} found {} row errors", self.target, errors.len());
                self.notify(
                    EventLevel::Warning,
                    format!("Validation found {} errors", errors.len()),
                );
            }
        }
        Ok(outcome)
    }

    fn validation_failed(&mut self, reason: String) -> ImportError {
        error!("Dry run against {} failed: {}", self.target, reason);
        if let Err(e) = self.session.abort_validation() {
            error!("Unexpected state after failed dry run: {}", e);
        }
        self.notify(EventLevel::Error, "Validation failed");
        ImportError::ValidationTransport(reason)
    }

    /// Upload the validated rows chunk by chunk
    pub async fn upload(&mut self, cancel: &CancellationToken) -> Result<UploadReport, ImportError> {
        if let Err(e) = self.session.begin_upload(self.settings.chunk_size) {
            self.notify(EventLevel::Error, e.to_string());
            return Err(e);
        }
        let start_chunk = self.session.resume_from();
        self.notify(EventLevel::Info, "Uploading...");

        let Self { api, target, settings, session, sink, .. } = self;
        let uploader = ChunkedUploader::new(&**api, *target, settings.chunk_size, settings.request_timeout);
        let session_id = session.id();
        // Rows are cloned out so progress can update the session while they are borrowed
        let rows = session.parsed().map(|p| p.rows.clone()).unwrap_or_default();

        let result = uploader
            .upload(&rows, start_chunk, cancel, |progress| {
                if let Err(e) = session.record_progress(progress.percent) {
                    error!("Unexpected state while uploading: {}", e);
                }
                sink.emit(WorkflowEvent {
                    session_id,
                    level: EventLevel::Progress,
                    status: session.status(),
                    progress: session.progress(),
                    message: format!(
                        "Uploaded chunk {} of {}",
                        progress.chunk_index + 1,
                        progress.total_chunks
                    ),
                    timestamp: Utc::now(),
                });
            })
            .await;

        match result {
            Ok(report) => {
                self.session.finish_upload()?;
                let message = if report.resumed_from > 0 {
                    format!(
                        "Successfully imported {} rows! (resumed at chunk {} of {})",
                        report.rows_uploaded,
                        report.resumed_from + 1,
                        report.total_chunks
                    )
                } else {
                    format!("Successfully imported {} rows!", report.rows_uploaded)
                };
                self.notify(EventLevel::Success, message);
                Ok(report)
            }
            Err(e) => {
                self.session.fail_upload(&e)?;
                let message = match self.session.last_failure() {
                    Some(failure) if failure.partial => format!(
                        "{}. Imported chunks are not rolled back; re-run the dry run and upload to resume at chunk {}",
                        failure.message,
                        failure.resume_from + 1
                    ),
                    Some(failure) => failure.message.clone(),
                    None => e.to_string(),
                };
                self.notify(EventLevel::Error, message);
                Err(e)
            }
        }
    }
}
