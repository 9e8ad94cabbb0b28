//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub changes: ChangesConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Server bind configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Change-notification engine tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ChangesConfig {
    /// How long a connection may stay missing before its session is reclaimed
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,
    /// Period of the idle sweep
    #[serde(default = "default_idle_interval_secs")]
    pub idle_interval_secs: u64,
    /// Period of the heartbeat frame pushed on every events socket
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Capacity of the per-socket outbound channel
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl ChangesConfig {
    #[must_use]
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }

    #[must_use]
    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

impl Default for ChangesConfig {
    fn default() -> Self {
        Self {
            expiry_secs: default_expiry_secs(),
            idle_interval_secs: default_idle_interval_secs(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "changes-gateway".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_expiry_secs() -> u64 {
    45
}

fn default_idle_interval_secs() -> u64 {
    10
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_outbound_buffer() -> usize {
    256
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

/// Like `parse_or`, but zero is rejected
fn parse_nonzero_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if value == T::default() {
        return Err(ConfigError::InvalidValue(key, "0".to_string()));
    }
    Ok(value)
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("GATEWAY_PORT").ok_or(ConfigError::MissingVar("GATEWAY_PORT"))?;
        let port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("GATEWAY_PORT", port))?;

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            gateway: ServerConfig {
                host: lookup("GATEWAY_HOST").unwrap_or_else(default_host),
                port,
            },
            changes: ChangesConfig {
                expiry_secs: parse_or(&lookup, "CHANGES_EXPIRY_SECS", default_expiry_secs())?,
                idle_interval_secs: parse_nonzero_or(
                    &lookup,
                    "CHANGES_IDLE_INTERVAL_SECS",
                    default_idle_interval_secs(),
                )?,
                heartbeat_interval_secs: parse_nonzero_or(
                    &lookup,
                    "CHANGES_HEARTBEAT_INTERVAL_SECS",
                    default_heartbeat_interval_secs(),
                )?,
                outbound_buffer: parse_nonzero_or(
                    &lookup,
                    "CHANGES_OUTBOUND_BUFFER",
                    default_outbound_buffer(),
                )?,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
