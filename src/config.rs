//! Application configuration
//!
//! Values are layered: built-in defaults, then `config/default.toml` when present,
//! then `LOCATION_LOGGER__SECTION__KEY` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::models::error::StartupError;
use crate::models::location::ValidationPolicy;

pub const ENV_PREFIX: &str = "LOCATION_LOGGER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
    pub rate_limit: RateLimitConfig,
    pub security: SecurityConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub sqlite_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Returned to the browser after a successful submission; `null` when unset.
    pub redirect_url: Option<String>,
    pub enforce_coordinate_bounds: bool,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub window: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub permissions_policy: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// HS256 secret guarding the read views. Open access when unset.
    pub jwt_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            sqlite_path: PathBuf::from("data/app.db"),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            permissions_policy: "geolocation=()".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_prefix(ENV_PREFIX)
    }

    fn load_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), StartupError> {
        self.rate_limit.validate()?;
        self.storage.validate()?;
        if self
            .admin
            .jwt_secret
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            return Err(StartupError::InvalidConfig {
                message: "Admin JWT secret cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> Result<SocketAddr, StartupError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| StartupError::InvalidConfig {
                message: format!("Invalid bind address: {e}"),
            })
    }
}

impl RateLimitConfig {
    fn validate(&self) -> Result<(), StartupError> {
        if self.max_requests == 0 {
            return Err(StartupError::InvalidConfig {
                message: "Rate limit must allow at least one request".to_string(),
            });
        }
        if self.window.is_zero() {
            return Err(StartupError::InvalidConfig {
                message: "Rate limit window must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), StartupError> {
        if self.backend == StorageBackend::Sqlite && self.sqlite_path.as_os_str().is_empty() {
            return Err(StartupError::InvalidConfig {
                message: "SQLite path cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl IngestConfig {
    pub fn policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            enforce_coordinate_bounds: self.enforce_coordinate_bounds,
        }
    }
}
