//! Configuration for the cache layer.
//!
//! Loaded from TOML; every section falls back to defaults except the store
//! address and key prefix, which must be given explicitly.

use crate::error::CacheError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Store connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Namespace prepended to every key (e.g. `"app:"`).
    #[serde(default)]
    pub prefix: Option<String>,
    /// Store address: `redis://host:port` or `host:port`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json_format: bool,
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            prefix: None,
            url: None,
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl CacheConfig {
    pub fn new(prefix: impl Into<String>, url: impl Into<String>) -> Self {
        CacheConfig {
            prefix: Some(prefix.into()),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Both `prefix` and `url` are required and must be non-empty.
    pub fn validate(&self) -> Result<(&str, &str), CacheError> {
        match (self.prefix.as_deref(), self.url.as_deref()) {
            (Some(prefix), Some(url)) if !prefix.is_empty() && !url.is_empty() => Ok((prefix, url)),
            _ => Err(CacheError::Config("missing in memory arguments: prefix and url are required".to_string())),
        }
    }

    /// `host:port` part of the url.
    pub fn address(&self) -> Result<String, CacheError> {
        let (_, url) = self.validate()?;
        let addr = url.strip_prefix("redis://").unwrap_or(url);
        // Drop credentials and database suffix; neither is handled here.
        let addr = addr.rsplit('@').next().unwrap_or(addr);
        let addr = addr.split('/').next().unwrap_or(addr);
        if addr.is_empty() {
            return Err(CacheError::Config(format!("invalid store url '{}'", url)));
        }
        if addr.contains(':') {
            Ok(addr.to_string())
        } else {
            Ok(format!("{}:6379", addr))
        }
    }
}

impl std::str::FromStr for Config {
    type Err = CacheError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        toml::from_str(contents).map_err(|e| CacheError::Config(e.to_string()))
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| CacheError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        contents.parse()
    }
}
