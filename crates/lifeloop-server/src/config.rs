//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use lifeloop_shared::constants::{DEFAULT_HTTP_PORT, MAX_BATCH_SIZE};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Directory holding one JSON file per identity collection.
    /// Env: `DATA_PATH`
    /// Default: `./data`
    pub data_path: PathBuf,

    /// Bearer token required on every collection route.
    /// Env: `API_TOKEN`
    /// Default: empty (API open, development only).
    pub api_token: Option<String>,

    /// Maximum number of records accepted by one batch write.
    /// Env: `MAX_BATCH_SIZE`
    /// Default: `500`
    pub max_batch_size: usize,

    /// Maximum request body size in bytes.
    /// Env: `MAX_BODY_BYTES`
    /// Default: 8 MiB
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            data_path: PathBuf::from("./data"),
            api_token: None,
            max_batch_size: MAX_BATCH_SIZE,
            max_body_bytes: 8 * 1024 * 1024, // 8 MiB
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Some(path) = lookup("DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }

        if let Some(token) = lookup("API_TOKEN") {
            if !token.is_empty() {
                config.api_token = Some(token);
            }
        }

        if let Some(val) = lookup("MAX_BATCH_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_batch_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_BATCH_SIZE, using default"),
            }
        }

        if let Some(val) = lookup("MAX_BODY_BYTES") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_body_bytes = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_BODY_BYTES, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}
