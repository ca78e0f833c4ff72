//! Configuration system for Eyeshield.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `config.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `EYESHIELD_SERVER_HOST` - Server bind address
//! - `EYESHIELD_SERVER_PORT` - Server port
//! - `EYESHIELD_STORAGE_PATH` - Path of the JSON license file
//! - `EYESHIELD_LICENSE_KEY_PREFIX` - License key prefix
//! - `EYESHIELD_LOGGING_ENABLED` - Install the log subscriber
//! - `EYESHIELD_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use config::{Config, ConfigBuilder};
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;

use crate::errors::{LicenseError, LicenseResult};
use crate::license_key::DEFAULT_KEY_PREFIX;

/// Global configuration singleton.
static CONFIG: OnceLock<EyeshieldConfig> = OnceLock::new();

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EyeshieldConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// License file configuration
    pub storage: StorageConfig,
    /// License key configuration
    pub license: LicenseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3324,
        }
    }
}

impl ServerConfig {
    /// `host:port`, suitable for binding a listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// License file configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON file mirroring the registry
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "licenses.json".to_string(),
        }
    }
}

/// License key generation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Prefix for generated license keys (e.g., "EyesShield" -> "EyesShield-<uuid>")
    pub key_prefix: String,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
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
            level: "info".to_string(),
        }
    }
}

fn config_err(e: config::ConfigError) -> LicenseError {
    LicenseError::ConfigError(e.to_string())
}

impl EyeshieldConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` file (optional)
    /// 3. Environment variables
    pub fn load() -> LicenseResult<Self> {
        let builder = Self::defaults()?
            // Load from config.toml (optional)
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables
            .set_override_option("server.host", env::var("EYESHIELD_SERVER_HOST").ok())
            .map_err(config_err)?
            .set_override_option(
                "server.port",
                env::var("EYESHIELD_SERVER_PORT")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("storage.path", env::var("EYESHIELD_STORAGE_PATH").ok())
            .map_err(config_err)?
            .set_override_option(
                "license.key_prefix",
                env::var("EYESHIELD_LICENSE_KEY_PREFIX").ok(),
            )
            .map_err(config_err)?
            .set_override_option(
                "logging.enabled",
                env::var("EYESHIELD_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("logging.level", env::var("EYESHIELD_LOG_LEVEL").ok())
            .map_err(config_err)?;

        let settings = builder
            .build()
            .map_err(|e| LicenseError::ConfigError(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| LicenseError::ConfigError(format!("failed to deserialize config: {e}")))
    }

    fn defaults() -> LicenseResult<ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();
        Config::builder()
            .set_default("server.host", defaults.server.host)
            .map_err(config_err)?
            .set_default("server.port", i64::from(defaults.server.port))
            .map_err(config_err)?
            .set_default("storage.path", defaults.storage.path)
            .map_err(config_err)?
            .set_default("license.key_prefix", defaults.license.key_prefix)
            .map_err(config_err)?
            .set_default("logging.enabled", defaults.logging.enabled)
            .map_err(config_err)?
            .set_default("logging.level", defaults.logging.level)
            .map_err(config_err)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.server.port == 0 {
            return Err(LicenseError::ConfigError(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if self.storage.path.trim().is_empty() {
            return Err(LicenseError::ConfigError(
                "storage.path cannot be empty".to_string(),
            ));
        }

        if self.license.key_prefix.is_empty() {
            return Err(LicenseError::ConfigError(
                "license.key_prefix cannot be empty".to_string(),
            ));
        }
        if !self
            .license
            .key_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(LicenseError::ConfigError(format!(
                "license.key_prefix may only contain letters, digits and '_'. Got '{}'",
                self.license.key_prefix
            )));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(LicenseError::ConfigError(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> LicenseResult<&'static EyeshieldConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = EyeshieldConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is valid.
    Ok(CONFIG.get_or_init(|| config))
}

/// Initialize configuration explicitly.
///
/// Call this early in your application to catch configuration errors.
pub fn init_config() -> LicenseResult<&'static EyeshieldConfig> {
    get_config()
}
