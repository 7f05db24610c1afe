//! Chunked uploader
//!
//! Splits validated rows into contiguous fixed-size chunks and submits them
//! one at a time. Chunk N+1 is never dispatched before chunk N has resolved,
//! which bounds backend load and keeps progress monotonic.
//!
//! A failed chunk stops the run. Chunks that already succeeded are not rolled
//! back; the error carries enough detail (chunks and rows imported, the chunk
//! to resume from) for the caller to report the partial import.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ImportError;
use crate::services::loader_client::LoaderApi;
use crate::types::{RawRow, TargetDatabase, UploadChunk, UploadProgress, UploadReport};

pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Partition `rows` into contiguous chunks of at most `chunk_size` rows
pub fn partition(rows: &[RawRow], chunk_size: usize) -> Vec<UploadChunk<'_>> {
    let chunk_size = chunk_size.max(1);
    let total_chunks = chunk_count(rows.len(), chunk_size);

    rows.chunks(chunk_size)
        .enumerate()
        .map(|(chunk_index, rows)| UploadChunk {
            rows,
            chunk_index,
            total_chunks,
        })
        .collect()
}

/// Number of chunks for `rows` rows, `ceil(rows / chunk_size)`
pub fn chunk_count(rows: usize, chunk_size: usize) -> usize {
    rows.div_ceil(chunk_size.max(1))
}

/// Progress percentage after `completed` of `total` chunks
pub fn progress_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Sequential chunk dispatcher bound to one backend and target
pub struct ChunkedUploader<'a> {
    api: &'a dyn LoaderApi,
    target: TargetDatabase,
    chunk_size: usize,
    request_timeout: Duration,
}

impl<'a> ChunkedUploader<'a> {
    pub fn new(
        api: &'a dyn LoaderApi,
        target: TargetDatabase,
        chunk_size: usize,
        request_timeout: Duration,
    ) -> Self {
        Self {
            api,
            target,
            chunk_size: chunk_size.max(1),
            request_timeout,
        }
    }

    /// Upload `rows` starting at chunk `start_chunk`.
    ///
    /// `on_progress` is called after each chunk succeeds and before the next
    /// one is dispatched. `cancel` is checked before every dispatch.
    pub async fn upload<F>(
        &self,
        rows: &[RawRow],
        start_chunk: usize,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<UploadReport, ImportError>
    where
        F: FnMut(UploadProgress),
    {
        let started = Instant::now();
        let chunks = partition(rows, self.chunk_size);
        let total_chunks = chunks.len();
        let start_chunk = start_chunk.min(total_chunks);

        // Rows imported by a previous run count towards the partial-import figures
        let mut rows_succeeded: usize = chunks[..start_chunk].iter().map(|c| c.rows.len()).sum();
        let mut completed = start_chunk;
        let mut rows_uploaded = 0usize;

        info!(
            "Uploading {} rows to {} in {} chunk(s) of up to {} (starting at chunk {})",
            rows.len(),
            self.target,
            total_chunks,
            self.chunk_size,
            start_chunk + 1
        );

        for chunk in &chunks[start_chunk..] {
            if cancel.is_cancelled() {
                warn!("Upload cancelled before chunk {}/{}", chunk.chunk_index + 1, total_chunks);
                return Err(ImportError::UploadCancelled {
                    next_chunk: chunk.chunk_index,
                    total_chunks,
                    chunks_succeeded: completed,
                    rows_succeeded,
                });
            }

            let outcome =
                tokio::time::timeout(self.request_timeout, self.api.upload_chunk(self.target, chunk)).await;

            let reason = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(format!("{:#}", e)),
                Err(_) => Some(format!(
                    "timed out after {}s",
                    self.request_timeout.as_secs_f64()
                )),
            };

            if let Some(reason) = reason {
                warn!(
                    "Chunk {}/{} failed after {} chunk(s) imported: {}",
                    chunk.chunk_index + 1,
                    total_chunks,
                    completed,
                    reason
                );
                return Err(ImportError::UploadChunk {
                    chunk_index: chunk.chunk_index,
                    total_chunks,
                    chunks_succeeded: completed,
                    rows_succeeded,
                    reason,
                });
            }

            completed += 1;
            rows_succeeded += chunk.rows.len();
            rows_uploaded += chunk.rows.len();

            let percent = progress_percent(completed, total_chunks);
            debug!("Chunk {}/{} done ({:.0}%)", chunk.chunk_index + 1, total_chunks, percent);
            on_progress(UploadProgress {
                completed_chunks: completed,
                total_chunks,
                chunk_index: chunk.chunk_index,
                percent,
            });
        }

        let report = UploadReport {
            total_chunks,
            resumed_from: start_chunk,
            chunks_uploaded: completed - start_chunk,
            rows_uploaded,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Upload to {} finished: {} rows in {} chunk(s), {}ms",
            self.target, report.rows_uploaded, report.chunks_uploaded, report.duration_ms
        );
        Ok(report)
    }
}
