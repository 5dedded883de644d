//! Service configuration, loaded from an optional TOML file.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [database]
//! url = "sqlite://hr_search.db?mode=rwc"
//! text_search = "auto"        # auto | fulltext | substring
//!
//! [rate_limit]
//! requests = 60
//! per = "minute"              # second | minute
//! idle_timeout_secs = 3600
//! sweep_interval_secs = 60
//! trust_forwarded_for = false
//!
//! [logging]
//! filter = "info"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::filtering::TextSearchMode;
use crate::rate_limit::{RateInterval, RateLimitConfig};

/// Environment variable that overrides `database.url`
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub text_search: TextSearchMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://hr_search.db?mode=rwc".to_string(),
            text_search: TextSearchMode::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub requests: u32,
    pub per: RateInterval,
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    /// Key clients by the first `X-Forwarded-For` entry instead of the peer
    /// address. Only enable behind a proxy that sets the header.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests: 60,
            per: RateInterval::Minute,
            idle_timeout_secs: 3600,
            sweep_interval_secs: 60,
            trust_forwarded_for: false,
        }
    }
}

impl RateLimitSettings {
    #[must_use]
    pub const fn limiter_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            requests: self.requests,
            per: self.per,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load the configuration from `path` (defaults when `None`), then apply
    /// the `DATABASE_URL` override and validate.
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read or parsed, or if a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_toml(&fs::read_to_string(path)?)?,
            None => Self::default(),
        };

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.database.url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without environment overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown enum values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".to_string()));
        }
        if self.rate_limit.requests == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.requests must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit.idle_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.idle_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".to_string()));
        }
        Ok(())
    }

    /// `host:port` to bind
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
