//! Configuration system for keyconsole.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `$XDG_CONFIG_HOME/keyconsole/config.toml`
//! 3. `keyconsole.toml` in the working directory
//! 4. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `KEYCONSOLE_API_URL` - Base URL of the activation key service
//! - `KEYCONSOLE_TIMEOUT_SECS` - Per-request timeout, 0 disables it
//! - `KEYCONSOLE_LOGGING_ENABLED` - Enable log output
//! - `KEYCONSOLE_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use config::Config;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::errors::{ConsoleError, ConsoleResult};

/// Default address of the key service.
pub const DEFAULT_API_URL: &str = "http://localhost:8001";

/// Global configuration singleton.
static CONFIG: OnceLock<ConsoleConfig> = OnceLock::new();

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Key service connection settings
    pub api: ApiConfig,
    /// HTTP transport settings
    pub http: HttpConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Key service connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, without a trailing slash
    pub url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds; 0 means no timeout
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "warn".to_string(),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("keyconsole").join("config.toml"))
}

fn config_err(e: config::ConfigError) -> ConsoleError {
    ConsoleError::Config(e.to_string())
}

impl ConsoleConfig {
    /// Load configuration from files and environment.
    pub fn load() -> ConsoleResult<Self> {
        let mut builder = Config::builder()
            .set_default("api.url", DEFAULT_API_URL)
            .map_err(config_err)?
            .set_default("http.timeout_secs", 0)
            .map_err(config_err)?
            .set_default("logging.enabled", true)
            .map_err(config_err)?
            .set_default("logging.level", "warn")
            .map_err(config_err)?
            .add_source(config::File::with_name("keyconsole").required(false));

        if let Some(path) = user_config_path() {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let builder = builder
            .set_override_option("api.url", env::var("KEYCONSOLE_API_URL").ok())
            .map_err(config_err)?
            .set_override_option(
                "http.timeout_secs",
                env::var("KEYCONSOLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_err)?
            .set_override_option(
                "logging.enabled",
                env::var("KEYCONSOLE_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("logging.level", env::var("KEYCONSOLE_LOG_LEVEL").ok())
            .map_err(config_err)?;

        let settings = builder
            .build()
            .map_err(|e| ConsoleError::Config(format!("failed to build config: {e}")))?;

        let mut config: ConsoleConfig = settings
            .try_deserialize()
            .map_err(|e| ConsoleError::Config(format!("failed to deserialize config: {e}")))?;
        config.api.url = config.api.url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConsoleResult<()> {
        if !(self.api.url.starts_with("http://") || self.api.url.starts_with("https://")) {
            return Err(ConsoleError::Config(format!(
                "api.url must start with http:// or https://, got '{}'",
                self.api.url
            )));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConsoleError::Config(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

/// Get the global configuration.
///
/// Loads and validates on first access, then returns the cached value.
pub fn get_config() -> ConsoleResult<&'static ConsoleConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = ConsoleConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is fine.
    let _ = CONFIG.set(config);
    CONFIG
        .get()
        .ok_or_else(|| ConsoleError::Config("configuration was not stored".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_service() {
        let config = ConsoleConfig::default();
        assert_eq!(config.api.url, DEFAULT_API_URL);
        assert!(config.http.timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_http_url() {
        let mut config = ConsoleConfig::default();
        config.api.url = "ftp://example.com".to_string();
        assert!(matches!(config.validate(), Err(ConsoleError::Config(_))));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = ConsoleConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn timeout_enabled_when_positive() {
        let http = HttpConfig { timeout_secs: 5 };
        assert_eq!(http.timeout(), Some(Duration::from_secs(5)));
    }
}
