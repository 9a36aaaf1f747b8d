//! Configuration loading for the notehub client.
//!
//! Only `[api]` is required. The other sections fall back to the listing
//! defaults when omitted.

use notehub_cache::CacheConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub token: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct QueryConfig {
    pub retry: u32,
    pub retry_delay_ms: u64,
    pub stale_time_ms: u64,
    pub gc_time_ms: u64,
    pub gc_interval_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retry: 1,
            retry_delay_ms: 1_000,
            stale_time_ms: 0,
            gc_time_ms: 5 * 60 * 1_000,
            gc_interval_ms: 60 * 1_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or NOTEHUB_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        match reqwest::Url::parse(base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::InvalidValue {
                    field: "api.base_url",
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
            Err(err) => {
                return Err(ConfigError::InvalidValue {
                    field: "api.base_url",
                    reason: err.to_string(),
                });
            }
        }
        if matches!(&self.api.token, Some(token) if token.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "api.token",
                reason: "must not be empty when set".to_string(),
            });
        }
        if self.api.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.query.gc_time_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "query.gc_time_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.query.gc_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "query.gc_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.search.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.debounce_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_retry(self.query.retry)
            .with_retry_delay(Duration::from_millis(self.query.retry_delay_ms))
            .with_stale_time(Duration::from_millis(self.query.stale_time_ms))
            .with_gc_time(Duration::from_millis(self.query.gc_time_ms))
    }

    pub fn gc_interval(&self) -> Duration {
        Duration::from_millis(self.query.gc_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("NOTEHUB_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
