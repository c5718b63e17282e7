//! Configuration management

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::token::FileTokenStore;

/// Production API used when no override is configured
pub const DEFAULT_API_BASE_URL: &str = "https://stellar.xdarren.com/api/v1";

/// Base used when the configured value is blank
pub const FALLBACK_API_BASE: &str = "/api/v1";

/// Origin for relative API bases (the gateway's default listen address)
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8090";

/// Console configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Normalized API base (absolute URL or path)
    pub api_base: String,

    /// Origin that relative bases are resolved against
    pub origin: String,

    /// Where the bearer token is persisted
    pub token_path: PathBuf,

    /// Per-request deadline
    pub request_timeout: Duration,

    /// Fail fast on authenticated endpoints when no token is stored
    pub strict_auth: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: normalize_api_base(DEFAULT_API_BASE_URL),
            origin: DEFAULT_ORIGIN.to_string(),
            token_path: FileTokenStore::default_path(),
            request_timeout: Duration::from_secs(30),
            strict_auth: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let raw_base = non_blank_var("STELLAR_ADMIN_API_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let origin = non_blank_var("STELLAR_ADMIN_ORIGIN")
            .map(|o| o.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());

        let token_path = non_blank_var("STELLAR_ADMIN_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(FileTokenStore::default_path);

        let request_timeout = non_blank_var("STELLAR_ADMIN_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let strict_auth = non_blank_var("STELLAR_ADMIN_STRICT_AUTH")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            anyhow::bail!("STELLAR_ADMIN_ORIGIN must be an http(s) URL, got {}", origin);
        }

        Ok(Self {
            api_base: normalize_api_base(&raw_base),
            origin,
            token_path,
            request_timeout,
            strict_auth,
        })
    }

    /// Config pointing at an explicit base, everything else default
    pub fn with_api_base(base: &str) -> Self {
        Self {
            api_base: normalize_api_base(base),
            ..Default::default()
        }
    }
}

/// Normalize a configured API base.
///
/// Trims whitespace and trailing slashes. Blank input falls back to
/// `/api/v1`; absolute URLs and rooted paths are kept; anything else is
/// rooted with a leading `/`.
pub fn normalize_api_base(base: &str) -> String {
    let value = base.trim().trim_end_matches('/');

    if value.is_empty() {
        return FALLBACK_API_BASE.to_string();
    }
    if value.starts_with("http://") || value.starts_with("https://") || value.starts_with('/') {
        return value.to_string();
    }
    format!("/{}", value)
}

fn non_blank_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
