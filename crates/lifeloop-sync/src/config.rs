//! Device-side configuration loaded from environment variables.
//!
//! All settings have defaults so a development build runs against a local
//! `lifeloop-server` with zero configuration.

use std::path::PathBuf;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the remote collection server.
    /// Env: `LIFELOOP_REMOTE_URL`
    /// Default: `http://localhost:8080`
    pub remote_url: String,

    /// Bearer token sent with every remote request.
    /// Env: `LIFELOOP_API_TOKEN`
    /// Default: none.
    pub api_token: Option<String>,

    /// Per-request timeout for remote calls, in seconds.
    /// Env: `LIFELOOP_TIMEOUT_SECS`
    /// Default: `15`
    pub timeout_secs: u64,

    /// Explicit path of the local database file.
    /// Env: `LIFELOOP_DB_PATH`
    /// Default: none (platform data directory).
    pub db_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote_url: format!(
                "http://localhost:{}",
                lifeloop_shared::constants::DEFAULT_HTTP_PORT
            ),
            api_token: None,
            timeout_secs: 15,
            db_path: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("LIFELOOP_REMOTE_URL") {
            if !url.is_empty() {
                config.remote_url = url;
            }
        }

        if let Some(token) = lookup("LIFELOOP_API_TOKEN") {
            if !token.is_empty() {
                config.api_token = Some(token);
            }
        }

        if let Some(val) = lookup("LIFELOOP_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_secs = secs,
                _ => tracing::warn!(value = %val, "Invalid LIFELOOP_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(path) = lookup("LIFELOOP_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        config
    }
}
