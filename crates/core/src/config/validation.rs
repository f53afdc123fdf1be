//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_asset(origin: &Url, field: &str, asset: &str) -> Result<(), ConfigError> {
    let resolved = origin.join(asset).map_err(|e| invalid(field, format!("{asset}: {e}")))?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return Err(invalid(field, format!("{asset}: unsupported scheme")));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_prefix` or `cache_version` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - `max_entries_per_partition` is 0
    /// - `eviction_interval_secs` is under one minute
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - a manifest entry does not resolve to an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_prefix.trim().is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }
        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        let origin = Url::parse(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme())));
        }

        if self.max_entries_per_partition == 0 {
            return Err(invalid("max_entries_per_partition", "must be greater than 0"));
        }
        if self.eviction_interval_secs < 60 {
            return Err(invalid("eviction_interval_secs", "must be at least 60 seconds"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        for asset in &self.static_assets {
            check_asset(&origin, "static_assets", asset)?;
        }
        for asset in &self.cdn_assets {
            check_asset(&origin, "cdn_assets", asset)?;
        }

        if self.cdn_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(invalid("cdn_hosts", "must not contain empty hosts"));
        }

        if self.static_assets.is_empty() && self.cdn_assets.is_empty() {
            tracing::warn!("install manifest is empty; the static partition starts empty");
        }

        Ok(())
    }
}
