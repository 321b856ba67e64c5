use std::str::FromStr;

use showcase_core::listing::{PageConfig, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use showcase_core::photo::{
    IngestConfig, DEFAULT_MAX_INPUT_BYTES, DEFAULT_MAX_INPUT_PIXELS, DEFAULT_MAX_OUTPUT_BYTES,
    DEFAULT_MAX_WIDTH,
};
use showcase_core::voting::{VotePolicy, DEFAULT_VOTE_WINDOW_SECS};

/// Extra body allowance on top of `max_upload_bytes` for multipart framing
/// and the text fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on draining background jobs after the listener closes.
    pub shutdown_timeout_secs: u64,
    /// Largest photo upload accepted, in bytes (default: 1 MiB).
    pub max_upload_bytes: usize,
    /// Stored photos are scaled down to this width (default: `1024`).
    pub max_image_width: u32,
    /// Stored photos are encoded to at most this many bytes (default: 500 KiB).
    pub max_photo_bytes: usize,
    /// Decoded pixel budget per upload (default: 24 megapixels).
    pub max_input_pixels: u64,
    /// Concurrent CPU-bound ingestions (default: `4`).
    pub max_concurrent_ingestions: usize,
    /// Rolling vote window per entry, in seconds (default: `3600`).
    pub vote_window_secs: i64,
    /// How often expired votes are pruned, in seconds (default: `3600`).
    pub vote_retention_interval_secs: u64,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            max_upload_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_image_width: DEFAULT_MAX_WIDTH,
            max_photo_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            max_input_pixels: DEFAULT_MAX_INPUT_PIXELS,
            max_concurrent_ingestions: 4,
            vote_window_secs: DEFAULT_VOTE_WINDOW_SECS,
            vote_retention_interval_secs: 3600,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `HOST`                         | `0.0.0.0`               |
    /// | `PORT`                         | `3000`                  |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`        | `30`                    |
    /// | `MAX_UPLOAD_BYTES`             | `1048576`               |
    /// | `MAX_IMAGE_WIDTH`              | `1024`                  |
    /// | `MAX_PHOTO_BYTES`              | `512000`                |
    /// | `MAX_INPUT_PIXELS`             | `24000000`              |
    /// | `MAX_CONCURRENT_INGESTIONS`    | `4`                     |
    /// | `VOTE_WINDOW_SECS`             | `3600`                  |
    /// | `VOTE_RETENTION_INTERVAL_SECS` | `3600`                  |
    /// | `DEFAULT_PAGE_SIZE`            | `20`                    |
    /// | `MAX_PAGE_SIZE`                | `100`                   |
    ///
    /// Panics on unparsable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port: env_or("PORT", defaults.port),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", defaults.shutdown_timeout_secs),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            max_image_width: env_or("MAX_IMAGE_WIDTH", defaults.max_image_width),
            max_photo_bytes: env_or("MAX_PHOTO_BYTES", defaults.max_photo_bytes),
            max_input_pixels: env_or("MAX_INPUT_PIXELS", defaults.max_input_pixels),
            max_concurrent_ingestions: env_or(
                "MAX_CONCURRENT_INGESTIONS",
                defaults.max_concurrent_ingestions,
            )
            .max(1),
            vote_window_secs: env_or("VOTE_WINDOW_SECS", defaults.vote_window_secs),
            vote_retention_interval_secs: env_or(
                "VOTE_RETENTION_INTERVAL_SECS",
                defaults.vote_retention_interval_secs,
            )
            .max(1),
            default_page_size: env_or("DEFAULT_PAGE_SIZE", defaults.default_page_size),
            max_page_size: env_or("MAX_PAGE_SIZE", defaults.max_page_size),
        }
    }

    /// Ingestion bounds derived from the upload and photo limits.
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            max_input_bytes: self.max_upload_bytes,
            max_width: self.max_image_width,
            max_output_bytes: self.max_photo_bytes,
            max_input_pixels: self.max_input_pixels,
            ..IngestConfig::default()
        }
    }

    pub fn vote_policy(&self) -> VotePolicy {
        VotePolicy::from_secs(self.vote_window_secs)
    }

    pub fn page_config(&self) -> PageConfig {
        PageConfig {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }

    /// Request body limit for the upload route.
    pub fn body_limit_bytes(&self) -> usize {
        self.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)
    }
}

/// Read `name` and parse it, falling back to `default` when unset.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid value: {e}")),
        Err(_) => default,
    }
}
