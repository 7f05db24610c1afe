//! Loader backend abstraction
//!
//! The REST backend exposes one endpoint per target database:
//! - `POST /{db}/loader/upload?dryRun=true` validates rows without persisting
//! - `POST /{db}/loader/upload` persists one chunk of rows
//!
//! `HttpLoaderApi` talks to the real backend, `MockLoaderApi` is an in-memory
//! stand-in for offline runs and tests.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::types::{
    ChunkUploadRequest, DryRunRequest, DryRunResponse, RawRow, TargetDatabase, UploadChunk,
    ValidationError,
};

/// Loader backend - abstraction over the validation and persistence endpoints
#[async_trait]
pub trait LoaderApi: Send + Sync {
    /// Validate all rows without persisting them.
    /// An empty result means every row is acceptable.
    async fn dry_run(&self, target: TargetDatabase, rows: &[RawRow]) -> Result<Vec<ValidationError>>;

    /// Persist one chunk of rows
    async fn upload_chunk(&self, target: TargetDatabase, chunk: &UploadChunk<'_>) -> Result<()>;

    /// Get the name of this implementation
    fn name(&self) -> &'static str;
}

// =============================================================================
// HTTP
// =============================================================================

/// Loader client for the sales console REST API
pub struct HttpLoaderApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLoaderApi {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("API token contains invalid header characters")?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("sales-loader/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base_url, config.api_token.as_deref(), config.request_timeout)
    }

    /// Upload endpoint for `target`
    pub fn endpoint(&self, target: TargetDatabase) -> String {
        format!("{}/{}/loader/upload", self.base_url, target.slug())
    }
}

/// Build an error message from a non-success response, including the
/// backend's `detail` field when it sends one
async fn failure_message(response: reqwest::Response) -> String {
    let status = response.status();
    let detail = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("detail").map(|d| match d {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }));

    match detail {
        Some(detail) => format!("server responded with {}: {}", status, detail),
        None => format!("server responded with {}", status),
    }
}

#[async_trait]
impl LoaderApi for HttpLoaderApi {
    async fn dry_run(&self, target: TargetDatabase, rows: &[RawRow]) -> Result<Vec<ValidationError>> {
        let url = self.endpoint(target);
        debug!("POST {}?dryRun=true ({} rows)", url, rows.len());

        let response = self
            .client
            .post(&url)
            .query(&[("dryRun", "true")])
            .json(&DryRunRequest { rows })
            .send()
            .await
            .context("Failed to send dry run request")?;

        if !response.status().is_success() {
            bail!(failure_message(response).await);
        }

        let body: DryRunResponse = response
            .json()
            .await
            .context("Failed to parse dry run response")?;

        Ok(body.into_errors())
    }

    async fn upload_chunk(&self, target: TargetDatabase, chunk: &UploadChunk<'_>) -> Result<()> {
        let url = self.endpoint(target);
        debug!(
            "POST {} chunk {}/{} ({} rows)",
            url,
            chunk.chunk_index + 1,
            chunk.total_chunks,
            chunk.rows.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&ChunkUploadRequest::from(chunk))
            .send()
            .await
            .context("Failed to send upload request")?;

        if !response.status().is_success() {
            bail!(failure_message(response).await);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// =============================================================================
// MOCK
// =============================================================================

/// Call recorded by `MockLoaderApi`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderCall {
    DryRun {
        target: TargetDatabase,
        rows: usize,
    },
    Upload {
        target: TargetDatabase,
        chunk_index: usize,
        total_chunks: usize,
        rows: usize,
        first_row: Option<usize>,
    },
}

/// In-memory loader backend with scripted outcomes
#[derive(Default)]
pub struct MockLoaderApi {
    row_errors: Vec<ValidationError>,
    fail_dry_run: bool,
    fail_at_chunk: Option<usize>,
    delay: Option<Duration>,
    calls: Mutex<Vec<LoaderCall>>,
}

impl MockLoaderApi {
    /// Accepts every row and every chunk
    pub fn new() -> Self {
        Self::default()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
impl MockLoaderApi {
    /// Dry run reports these row errors
    pub fn with_row_errors(mut self, errors: Vec<ValidationError>) -> Self {
        self.row_errors = errors;
        self
    }

    /// Dry run fails at the transport level
    pub fn failing_dry_run(mut self) -> Self {
        self.fail_dry_run = true;
        self
    }

    /// Upload of the chunk with this 0-based index fails
    pub fn failing_at_chunk(mut self, chunk_index: usize) -> Self {
        self.fail_at_chunk = Some(chunk_index);
        self
    }

    /// Every call sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<LoaderCall> {
        self.calls.lock().clone()
    }

    /// Indices of upload calls in dispatch order
    pub fn uploaded_chunks(&self) -> Vec<usize> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                LoaderCall::Upload { chunk_index, .. } => Some(*chunk_index),
                LoaderCall::DryRun { .. } => None,
            })
            .collect()
    }

    pub fn dry_run_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, LoaderCall::DryRun { .. }))
            .count()
    }
}

#[async_trait]
impl LoaderApi for MockLoaderApi {
    async fn dry_run(&self, target: TargetDatabase, rows: &[RawRow]) -> Result<Vec<ValidationError>> {
        self.calls.lock().push(LoaderCall::DryRun {
            target,
            rows: rows.len(),
        });
        self.pause().await;

        if self.fail_dry_run {
            bail!("server responded with 503 Service Unavailable");
        }
        Ok(self.row_errors.clone())
    }

    async fn upload_chunk(&self, target: TargetDatabase, chunk: &UploadChunk<'_>) -> Result<()> {
        self.calls.lock().push(LoaderCall::Upload {
            target,
            chunk_index: chunk.chunk_index,
            total_chunks: chunk.total_chunks,
            rows: chunk.rows.len(),
            first_row: chunk.rows.first().map(|r| r.number),
        });
        self.pause().await;

        if self.fail_at_chunk == Some(chunk.chunk_index) {
            bail!("server responded with 500 Internal Server Error");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Create the loader backend selected by `config.loader_backend`
pub fn create_loader_api(config: &Config) -> Result<Arc<dyn LoaderApi>> {
    match config.loader_backend.as_str() {
        "http" => {
            info!("Using HTTP loader backend at {}", config.api_base_url);
            Ok(Arc::new(HttpLoaderApi::from_config(config)?))
        }
        "mock" => {
            info!("Using mock loader backend");
            Ok(Arc::new(MockLoaderApi::new()))
        }
        other => {
            warn!("Unknown LOADER_BACKEND '{}', using http", other);
            Ok(Arc::new(HttpLoaderApi::from_config(config)?))
        }
    }
}
