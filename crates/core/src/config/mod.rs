//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SENIAL_SW_*)
//! 2. TOML config file (if SENIAL_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SENIAL_SW_*)
/// 2. TOML config file (if SENIAL_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via SENIAL_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the worker is scoped to. Relative request paths and the local
    /// asset manifest resolve against it.
    ///
    /// Set via SENIAL_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix shared by every partition name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version embedded in the partition names. Bumping it retires every
    /// partition of the previous version on the next activation.
    ///
    /// Set via SENIAL_SW_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Local paths pre-cached on install.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Third-party URLs pre-cached on install.
    #[serde(default = "default_cdn_assets")]
    pub cdn_assets: Vec<String>,

    /// Hosts served with stale-while-revalidate.
    #[serde(default = "default_cdn_hosts")]
    pub cdn_hosts: Vec<String>,

    /// Entries kept per partition by the eviction sweep.
    #[serde(default = "default_max_entries")]
    pub max_entries_per_partition: usize,

    /// Seconds between eviction sweeps.
    #[serde(default = "default_eviction_interval_secs")]
    pub eviction_interval_secs: u64,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SENIAL_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SENIAL_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SENIAL_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./senial-sw-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:5000".into()
}

fn default_cache_prefix() -> String {
    "senial".into()
}

fn default_cache_version() -> String {
    "1.5.0".into()
}

fn default_static_assets() -> Vec<String> {
    vec![
        "/".into(),
        "/static/dist/main.min.css".into(),
        "/static/dist/main.min.js".into(),
        "/static/favicon.ico".into(),
    ]
}

fn default_cdn_assets() -> Vec<String> {
    vec![
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css".into(),
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/js/bootstrap.bundle.min.js".into(),
        "https://cdn.jsdelivr.net/npm/bootstrap-icons@1.11.3/font/bootstrap-icons.min.css".into(),
    ]
}

fn default_cdn_hosts() -> Vec<String> {
    vec!["cdn.jsdelivr.net".into(), "cdnjs.cloudflare.com".into(), "unpkg.com".into()]
}

fn default_max_entries() -> usize {
    50
}

fn default_eviction_interval_secs() -> u64 {
    3600
}

fn default_user_agent() -> String {
    "senial-sw/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            static_assets: default_static_assets(),
            cdn_assets: default_cdn_assets(),
            cdn_hosts: default_cdn_hosts(),
            max_entries_per_partition: default_max_entries(),
            eviction_interval_secs: default_eviction_interval_secs(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

/// Names of the two partitions owned by the current version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheNames {
    /// Long-lived assets: stylesheets, scripts, fonts, icons, CDN bundles.
    pub static_name: String,
    /// Short-lived API and page responses.
    pub dynamic_name: String,
}

impl CacheNames {
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            static_name: format!("{prefix}-static-v{version}"),
            dynamic_name: format!("{prefix}-dynamic-v{version}"),
        }
    }

    /// True for the partitions the current version keeps on activation.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_name || name == self.dynamic_name
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Interval between eviction sweeps.
    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs)
    }

    /// Partition names for the configured prefix and version.
    pub fn cache_names(&self) -> CacheNames {
        CacheNames::new(&self.cache_prefix, &self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SENIAL_SW_`
    /// 2. TOML file from `SENIAL_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SENIAL_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SENIAL_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
