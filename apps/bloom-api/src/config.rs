//! API server configuration.
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. `bloom.toml` in the working directory (optional)
//! 3. `BLOOM_*` environment variables (`BLOOM_HTTP_PORT`, `BLOOM_DATABASE_PATH`, ...)

use std::path::PathBuf;
use std::time::Duration;

use bloom_db::{DbConfig, DEFAULT_FEED_CAPACITY};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Environment variable prefix.
const ENV_PREFIX: &str = "BLOOM";

/// Optional config file name (without extension).
const CONFIG_FILE: &str = "bloom";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Bind address
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Header carrying the authenticated user id, set by the upstream auth proxy
    pub identity_header: String,

    /// Reconnect delay advertised to SSE clients, in milliseconds
    pub sse_retry_ms: u64,

    /// Interval between SSE keep-alive comments, in seconds
    pub sse_keepalive_secs: u64,

    /// Change notifications buffered per subscriber
    pub feed_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 8080,
            bind_addr: "0.0.0.0".to_string(),
            database_path: PathBuf::from("bloom.db"),
            db_max_connections: 5,
            identity_header: "x-user-id".to_string(),
            sse_retry_ms: 5000,
            sse_keepalive_secs: 15,
            feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from defaults, `bloom.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(true, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn load_from(read_file: bool, env: Environment) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let mut builder = Config::builder()
            .set_default("http_port", i64::from(defaults.http_port))?
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("database_path", defaults.database_path.display().to_string())?
            .set_default("db_max_connections", i64::from(defaults.db_max_connections))?
            .set_default("identity_header", defaults.identity_header)?
            .set_default("sse_retry_ms", defaults.sse_retry_ms as i64)?
            .set_default("sse_keepalive_secs", defaults.sse_keepalive_secs as i64)?
            .set_default("feed_capacity", defaults.feed_capacity as i64)?;

        if read_file {
            builder = builder.add_source(File::new(CONFIG_FILE, FileFormat::Toml).required(false));
        }

        let config: ApiConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would only fail later at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_port == 0 {
            return Err(ConfigError::InvalidValue("http_port".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("db_max_connections".to_string()));
        }
        if self.feed_capacity == 0 {
            return Err(ConfigError::InvalidValue("feed_capacity".to_string()));
        }
        if self.sse_keepalive_secs == 0 {
            return Err(ConfigError::InvalidValue("sse_keepalive_secs".to_string()));
        }
        if axum::http::HeaderName::from_bytes(self.identity_header.as_bytes()).is_err() {
            return Err(ConfigError::InvalidValue("identity_header".to_string()));
        }
        Ok(())
    }

    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.http_port)
    }

    /// Pool configuration derived from this config.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .feed_capacity(self.feed_capacity)
    }

    pub fn sse_keepalive(&self) -> Duration {
        Duration::from_secs(self.sse_keepalive_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
