//! Configuration management

use std::time::Duration;

use anyhow::{self, Context, Result};

use crate::services::intake::DEFAULT_MAX_FILE_BYTES;
use crate::services::uploader::DEFAULT_CHUNK_SIZE;

const DEFAULT_BACKEND_HOST: &str = "localhost";
const DEFAULT_BACKEND_PORT: &str = "8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Sales console REST API base URL
    pub api_base_url: String,

    /// Bearer token sent with every request (optional)
    pub api_token: Option<String>,

    /// Maximum rows per upload request
    pub chunk_size: usize,

    /// Largest file accepted for import
    pub max_file_bytes: u64,

    /// Per-request timeout for dry runs and chunk uploads
    pub request_timeout: Duration,

    /// Loader backend: "http" or "mock"
    pub loader_backend: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: format!("http://{}:{}", DEFAULT_BACKEND_HOST, DEFAULT_BACKEND_PORT),
            api_token: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            loader_backend: "http".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from any variable source
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let api_base_url = match non_empty("API_BASE_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => backend_url(
                non_empty("BACKEND_HOST").as_deref(),
                non_empty("BACKEND_PORT").as_deref(),
            ),
        };

        let chunk_size = match non_empty("LOADER_CHUNK_SIZE") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .with_context(|| format!("LOADER_CHUNK_SIZE must be a positive integer, got '{}'", v))?,
            None => defaults.chunk_size,
        };
        if chunk_size == 0 {
            anyhow::bail!("LOADER_CHUNK_SIZE must be at least 1");
        }

        let max_file_bytes = match non_empty("LOADER_MAX_FILE_BYTES") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("LOADER_MAX_FILE_BYTES must be a byte count, got '{}'", v))?,
            None => defaults.max_file_bytes,
        };

        let request_timeout = match non_empty("LOADER_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse::<u64>()
                    .with_context(|| format!("LOADER_TIMEOUT_SECS must be whole seconds, got '{}'", v))?,
            ),
            None => defaults.request_timeout,
        };

        let loader_backend = non_empty("LOADER_BACKEND")
            .map(|v| v.trim().to_lowercase())
            .unwrap_or(defaults.loader_backend);

        Ok(Self {
            api_base_url,
            api_token: non_empty("API_TOKEN"),
            chunk_size,
            max_file_bytes,
            request_timeout,
            loader_backend,
        })
    }

    /// Apply command line overrides
    pub fn with_overrides(mut self, api_url: Option<&str>, chunk_size: Option<usize>) -> Result<Self> {
        if let Some(url) = api_url {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(size) = chunk_size {
            if size == 0 {
                anyhow::bail!("--chunk-size must be at least 1");
            }
            self.chunk_size = size;
        }
        Ok(self)
    }
}

/// Derive the API URL from host and port. Wildcard and loopback addresses
/// map to `localhost`.
fn backend_url(host: Option<&str>, port: Option<&str>) -> String {
    let host = match host.unwrap_or(DEFAULT_BACKEND_HOST) {
        "0.0.0.0" | "127.0.0.1" => DEFAULT_BACKEND_HOST,
        other => other,
    };
    let port = port.unwrap_or(DEFAULT_BACKEND_PORT);
    format!("http://{}:{}", host, port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.loader_backend, "http");
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_loopback_host_maps_to_localhost() {
        let config = config_from(&[("BACKEND_HOST", "0.0.0.0"), ("BACKEND_PORT", "9000")]).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:9000");

        let config = config_from(&[("BACKEND_HOST", "127.0.0.1")]).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");

        let config = config_from(&[("BACKEND_HOST", "api.internal")]).unwrap();
        assert_eq!(config.api_base_url, "http://api.internal:8000");
    }

    #[test]
    fn test_explicit_url_wins() {
        let config = config_from(&[
            ("API_BASE_URL", "https://ventas.example.com/"),
            ("BACKEND_HOST", "ignored"),
        ])
        .unwrap();
        assert_eq!(config.api_base_url, "https://ventas.example.com");
    }

    #[test]
    fn test_numeric_settings_are_validated() {
        assert!(config_from(&[("LOADER_CHUNK_SIZE", "0")]).is_err());
        assert!(config_from(&[("LOADER_CHUNK_SIZE", "lots")]).is_err());
        assert!(config_from(&[("LOADER_TIMEOUT_SECS", "-1")]).is_err());

        let config = config_from(&[
            ("LOADER_CHUNK_SIZE", "250"),
            ("LOADER_TIMEOUT_SECS", "5"),
            ("LOADER_MAX_FILE_BYTES", "1024"),
            ("LOADER_BACKEND", "Mock"),
            ("API_TOKEN", "abc"),
        ])
        .unwrap();
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_file_bytes, 1024);
        assert_eq!(config.loader_backend, "mock");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default()
            .with_overrides(Some("http://otro:1234/"), Some(50))
            .unwrap();
        assert_eq!(config.api_base_url, "http://otro:1234");
        assert_eq!(config.chunk_size, 50);

        assert!(Config::default().with_overrides(None, Some(0)).is_err());
    }
}
