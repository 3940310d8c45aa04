//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod logging;
pub mod offload;
pub mod worker;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::logging::LoggingConfig;
use self::offload::OffloadSettings;
use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// (default.toml, an optional explicit file, the environment overlay and
/// `OFFLOAD__` environment variables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP control surface settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// CDN credentials and intake policy.
    #[serde(default)]
    pub offload: OffloadSettings,
    /// Processor and scheduler settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Idle connection timeout in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default`, the optional explicit `path`, the
    /// environment-specific overlay `config/{env}` and environment variables
    /// prefixed with `OFFLOAD__` (e.g. `OFFLOAD__OFFLOAD__API_KEY`).
    pub fn load(path: Option<&str>, env: &str) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("OFFLOAD")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("offload.enabled_tenants")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}
