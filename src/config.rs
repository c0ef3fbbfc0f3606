//! Environment-driven service configuration.
//!
//! Only the HTTP layer and the binary read this; validation and mapping never touch
//! the environment.

use anyhow::{anyhow, Result};
use std::time::Duration;

use crate::validation::DEFAULT_MODEL;

/// Default listen address when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8787";

/// Runtime configuration for the proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Upstream base URL without trailing slash, e.g. "https://api.example.com/v1".
    pub upstream_base_url: String,
    /// Bearer token for the upstream; no Authorization header is sent when `None`.
    pub upstream_api_key: Option<String>,
    /// Model ids advertised by `/v1/models`.
    pub models: Vec<String>,
    /// Listen address for the HTTP server.
    pub bind_addr: String,
    /// Overall timeout for upstream calls.
    pub upstream_timeout: Option<Duration>,
    /// Bypass HTTP(S)_PROXY settings for upstream calls.
    pub no_proxy: bool,
}

impl Config {
    /// Config pointing at `base_url` with every other setting at its default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            upstream_base_url: normalize_base_url(&base_url.into()),
            upstream_api_key: None,
            models: vec![DEFAULT_MODEL.to_string()],
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            upstream_timeout: None,
            no_proxy: false,
        }
    }

    /// Build the configuration from process environment variables.
    ///
    /// Environment:
    /// - UPSTREAM_BASE_URL (required)
    /// - UPSTREAM_API_KEY
    /// - UPSTREAM_MODELS = comma-separated model ids
    /// - BIND_ADDR
    /// - UPSTREAM_TIMEOUT_SECONDS (u64)
    /// - UPSTREAM_NO_PROXY = 1|true|yes|on
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base = get("UPSTREAM_BASE_URL")
            .ok_or_else(|| anyhow!("UPSTREAM_BASE_URL not set (mandatory)"))?;
        let mut config = Config::new(base);

        config.upstream_api_key = get("UPSTREAM_API_KEY");

        if let Some(list) = get("UPSTREAM_MODELS") {
            let models = parse_model_list(&list);
            if !models.is_empty() {
                config.models = models;
            }
        }

        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(secs) = get("UPSTREAM_TIMEOUT_SECONDS") {
            let n = secs
                .parse::<u64>()
                .map_err(|e| anyhow!("UPSTREAM_TIMEOUT_SECONDS must be an integer: {e}"))?;
            config.upstream_timeout = Some(Duration::from_secs(n));
        }

        config.no_proxy = get("UPSTREAM_NO_PROXY")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Ok(config)
    }

    /// Full URL of the upstream chat-completions endpoint.
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.upstream_base_url)
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn is_truthy(v: &str) -> bool {
    matches!(
        v.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
