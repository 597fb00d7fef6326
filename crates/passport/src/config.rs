//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Applications provisioned at start-up
    #[serde(default)]
    pub apps: Vec<AppConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    /// sqlx connection URL, creating the file if missing
    pub fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// Minimum token lifetime (1 minute)
const MIN_TOKEN_TTL_SECS: u64 = 60;

/// Maximum token lifetime (30 days)
const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 3600;

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of issued tokens in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

impl AuthConfig {
    /// Token TTL clamped to [60, 2592000] seconds, warning if adjusted
    pub fn validated_token_ttl(&self) -> Duration {
        let secs = if self.token_ttl_secs < MIN_TOKEN_TTL_SECS {
            warn!(
                "token_ttl_secs {} is below minimum {}, using minimum",
                self.token_ttl_secs, MIN_TOKEN_TTL_SECS
            );
            MIN_TOKEN_TTL_SECS
        } else if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            warn!(
                "token_ttl_secs {} exceeds maximum {}, using maximum",
                self.token_ttl_secs, MAX_TOKEN_TTL_SECS
            );
            MAX_TOKEN_TTL_SECS
        } else {
            self.token_ttl_secs
        };
        Duration::from_secs(secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

/// A client application and its token signing secret
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub id: i32,
    pub name: String,
    pub secret: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    44044
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_db_path() -> String {
    "./data/passport.db".to_string()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    File,
    Defaults,
}

impl Config {
    /// Load configuration from a file, falling back to defaults when it is absent.
    ///
    /// Runs before logging is set up, so the caller reports the origin.
    pub fn load(path: &str) -> Result<(Self, ConfigOrigin)> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            return Ok((Self::default(), ConfigOrigin::Defaults));
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;

        Ok((config, ConfigOrigin::File))
    }

    /// Reject settings that could never serve a request
    fn validate(&self) -> Result<()> {
        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("server.request_timeout_secs must be greater than zero");
        }
        for app in &self.apps {
            if app.id == 0 {
                anyhow::bail!("Application '{}' must have a non-zero id", app.name);
            }
            if app.secret.is_empty() {
                anyhow::bail!("Application '{}' has an empty secret", app.name);
            }
        }
        Ok(())
    }
}
