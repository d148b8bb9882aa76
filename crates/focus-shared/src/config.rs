//! Configuration management
//!
//! Layers, lowest to highest: built-in defaults, `config/default.toml`,
//! `config/{APP_ENV}.toml`, environment variables (`__` separator), and the
//! legacy `CONVERSATION_CACHE_*` variables.

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_HISTORY_TTL_SECONDS, DEFAULT_MAX_HISTORY_LENGTH, CONVERSATION_KEY_PREFIX,
    LEGACY_CACHE_LIMIT_ENV, LEGACY_CACHE_TTL_ENV,
};
use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub history: HistorySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DurableBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub backend: DurableBackend,
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FastBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisSettings {
    pub backend: FastBackend,
    pub url: String,
    pub max_connections: usize,
    pub key_prefix: String,
}

/// Bounds for the per-user conversation history cache.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HistorySettings {
    pub max_history_length: usize,
    pub ttl_seconds: u64,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            ttl_seconds: DEFAULT_HISTORY_TTL_SECONDS,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    /// Directory for daily-rotated log files; stdout only when unset.
    pub directory: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        Self::load_for(&env)
    }

    /// Layered configuration for the named environment; `app.env` reports `env`.
    pub fn load_for(env: &str) -> Result<Self, AppError> {
        let config = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .set_override("app.env", env)?
            .set_override_option(
                "history.max_history_length",
                std::env::var(LEGACY_CACHE_LIMIT_ENV).ok(),
            )?
            .set_override_option("history.ttl_seconds", std::env::var(LEGACY_CACHE_TTL_ENV).ok())?
            .build()?;

        let settings: AppConfig = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Build a configuration from defaults plus a single TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, AppError> {
        let config = Self::defaults()?
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;

        let settings: AppConfig = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8000)?
            .set_default("app.name", "focus-server")?
            .set_default("database.backend", "postgres")?
            .set_default("database.url", "postgres://localhost:5432/focus_hub")?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_seconds", 3)?
            .set_default("redis.backend", "redis")?
            .set_default("redis.url", "redis://localhost:6379/0")?
            .set_default("redis.max_connections", 16)?
            .set_default("redis.key_prefix", CONVERSATION_KEY_PREFIX)?
            .set_default("history.max_history_length", DEFAULT_MAX_HISTORY_LENGTH as i64)?
            .set_default("history.ttl_seconds", DEFAULT_HISTORY_TTL_SECONDS as i64)?
            .set_default("logging.level", "info,focus_server=debug")?
            .set_default("logging.format", "json")
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.history.max_history_length == 0 {
            return Err(AppError::InvalidConfig(
                "history.max_history_length must be at least 1".to_string(),
            ));
        }
        if self.history.ttl_seconds == 0 {
            return Err(AppError::InvalidConfig(
                "history.ttl_seconds must be at least 1".to_string(),
            ));
        }
        if self.database.backend == DurableBackend::Postgres && self.database.url.trim().is_empty() {
            return Err(AppError::InvalidConfig(
                "database.url is required for the postgres backend".to_string(),
            ));
        }
        if self.redis.backend == FastBackend::Redis && self.redis.url.trim().is_empty() {
            return Err(AppError::InvalidConfig(
                "redis.url is required for the redis backend".to_string(),
            ));
        }
        Ok(())
    }
}
