//! Connection configuration
//!
//! A `ConnectionConfig` is handed to the registry unchanged apart from the
//! connection name and the registered entity list, which the registry injects
//! when it opens the connection.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backends::DatabasePoolConfig;
use crate::error::ConfigError;
use crate::metadata::EntityMetadata;

const DEFAULT_CONNECTION_NAME: &str = "default";

/// Configuration for one named database connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Name the connection is registered under
    pub name: String,
    /// Connection whose teardown `wait` blocks on; falls back to `name`
    #[serde(default)]
    pub default_name: Option<String>,
    /// Database URL, e.g. `postgres://user:pw@host/db` or `sqlite://app.db`
    pub url: String,
    #[serde(default)]
    pub pool: DatabasePoolConfig,
    /// Entities mapped on this connection in addition to the registry's own
    #[serde(skip)]
    pub entities: Vec<Arc<EntityMetadata>>,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_CONNECTION_NAME.to_string(),
            default_name: None,
            url: url.into(),
            pool: DatabasePoolConfig::default(),
            entities: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    pub fn with_pool(mut self, pool: DatabasePoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_entity(mut self, entity: Arc<EntityMetadata>) -> Self {
        self.entities.push(entity);
        self
    }

    /// Name of the connection `ConnectionRegistry::wait` watches
    pub fn wait_target(&self) -> &str {
        self.default_name.as_deref().unwrap_or(&self.name)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.pool.acquire_timeout_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "url".to_string(),
                reason: "Database URL cannot be empty".to_string(),
            });
        }

        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "name".to_string(),
                reason: "Connection name cannot be empty".to_string(),
            });
        }

        if self.pool.max_connections == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "pool.max_connections".to_string(),
                reason: "Pool must allow at least one connection".to_string(),
            });
        }

        if self.pool.min_connections > self.pool.max_connections {
            return Err(ConfigError::ValidationFailed {
                field: "pool.min_connections".to_string(),
                reason: format!(
                    "Minimum connections ({}) exceeds maximum ({})",
                    self.pool.min_connections, self.pool.max_connections
                ),
            });
        }

        Ok(())
    }

    /// Load configuration from `DATABASE_URL` and the optional `DB_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnvVar {
            var: "DATABASE_URL".to_string(),
        })?;

        let name = env::var("DB_CONNECTION_NAME").unwrap_or_else(|_| DEFAULT_CONNECTION_NAME.to_string());
        let default_name = env::var("DB_DEFAULT_NAME").ok().filter(|value| !value.is_empty());

        let mut pool = DatabasePoolConfig::default();
        if let Some(max) = parse_env::<u32>("DB_POOL_MAX", "max_connections", "positive integer")? {
            pool.max_connections = max;
        }
        if let Some(min) = parse_env::<u32>("DB_POOL_MIN", "min_connections", "non-negative integer")? {
            pool.min_connections = min;
        }
        if let Some(timeout) = parse_env::<u64>("DB_ACQUIRE_TIMEOUT", "acquire_timeout_seconds", "valid number of seconds")? {
            pool.acquire_timeout_seconds = timeout;
        }

        let config = ConnectionConfig {
            name,
            default_name,
            url,
            pool,
            entities: Vec::new(),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, field: &str, expected: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse::<T>().map(Some).map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            value,
            expected: expected.to_string(),
        }),
        Err(_) => Ok(None),
    }
}
