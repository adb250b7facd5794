//! Connection Registry
//!
//! Process-wide map of named connections. Opening is idempotent per name:
//! an open connection is returned as is, a closed one is replaced.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::Connection;
use crate::backends::DatabaseBackendRegistry;
use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use crate::metadata::{EntityCatalog, EntityMetadata};

const WAIT_INTERVAL: Duration = Duration::from_millis(100);

static GLOBAL_REGISTRY: OnceLock<ConnectionRegistry> = OnceLock::new();

/// Registry of named database connections
pub struct ConnectionRegistry {
    backends: DatabaseBackendRegistry,
    connections: DashMap<String, Arc<Connection>>,
    /// Entities added to every connection opened through this registry
    entities: DashMap<String, Arc<EntityMetadata>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    /// Registry with the PostgreSQL and SQLite backends
    pub fn new() -> Self {
        Self::with_backends(DatabaseBackendRegistry::with_defaults())
    }

    pub fn with_backends(backends: DatabaseBackendRegistry) -> Self {
        Self {
            backends,
            connections: DashMap::new(),
            entities: DashMap::new(),
        }
    }

    /// The process-wide registry used by entity services
    pub fn global() -> &'static ConnectionRegistry {
        GLOBAL_REGISTRY.get_or_init(ConnectionRegistry::new)
    }

    /// Register entities mapped on every connection opened afterwards
    pub fn register_entities<I>(&self, entities: I)
    where
        I: IntoIterator<Item = Arc<EntityMetadata>>,
    {
        for entity in entities {
            self.entities.entry(entity.name.clone()).or_insert(entity);
        }
    }

    /// Return the open connection named `name`, opening it if needed
    ///
    /// The supplied configuration is cloned, renamed to `name` and extended
    /// with the registered entities before the pool is created.
    pub async fn connect(&self, config: &ConnectionConfig, name: &str) -> OrmResult<Arc<Connection>> {
        tracing::debug!("Connection requested for '{}'", name);

        if name.is_empty() {
            return Err(OrmError::Argument("Connection name was not provided.".to_string()));
        }

        if let Some(existing) = self.get_connection(name).filter(|c| c.is_connected()) {
            tracing::debug!("Reusing open connection '{}'", name);
            return Ok(existing);
        }

        tracing::debug!("Opening new connection '{}'", name);

        let mut connection_config = config.clone();
        connection_config.name = name.to_string();
        for entity in self.entities.iter() {
            connection_config.entities.push(entity.value().clone());
        }
        connection_config.validate()?;

        for entity in &connection_config.entities {
            entity.validate()?;
        }
        let catalog: EntityCatalog = connection_config.entities.iter().cloned().collect();

        let backend = self.backends.backend_for_url(&connection_config.url)?;
        let pool = match backend.create_pool(&connection_config.url, &connection_config.pool).await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!("Failed to open connection '{}': {}", name, e);
                return Err(e);
            }
        };

        let connection = Arc::new(Connection::new(connection_config, backend.as_ref(), pool, Arc::new(catalog)));

        let raced = match self.connections.entry(name.to_string()) {
            Entry::Occupied(entry) if entry.get().is_connected() => Some(entry.get().clone()),
            Entry::Occupied(mut entry) => {
                entry.insert(connection.clone());
                None
            }
            Entry::Vacant(entry) => {
                entry.insert(connection.clone());
                None
            }
        };

        if let Some(existing) = raced {
            tracing::debug!("Connection '{}' was opened concurrently, discarding duplicate pool", name);
            if let Err(e) = connection.close().await {
                tracing::warn!("Failed to close duplicate pool for '{}': {}", name, e);
            }
            return Ok(existing);
        }

        tracing::debug!("Connection '{}' opened", name);
        Ok(connection)
    }

    /// Close the connection named `name` if it is open
    pub async fn close(&self, name: &str) -> OrmResult<()> {
        tracing::debug!("Closing connection '{}'", name);

        let Some(connection) = self.get_connection(name) else {
            return Ok(());
        };
        if !connection.is_connected() {
            return Ok(());
        }

        match connection.close().await {
            Ok(()) => {
                tracing::debug!("Connection '{}' closed", name);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to close connection '{}': {}", name, e);
                Err(e)
            }
        }
    }

    /// Connection registered under `name`, open or not
    pub fn get_connection(&self, name: &str) -> Option<Arc<Connection>> {
        self.connections.get(name).map(|entry| entry.value().clone())
    }

    /// Names of every registered connection
    pub fn connection_names(&self) -> Vec<String> {
        self.connections.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Resolve once the connection `config` points at is absent or closed
    ///
    /// Polls every 100ms without an upper bound; wrap it in
    /// `tokio::time::timeout` when the teardown may never happen.
    pub async fn wait(&self, config: &ConnectionConfig) {
        let target = config.wait_target();
        while self.get_connection(target).map(|c| c.is_connected()).unwrap_or(false) {
            tracing::debug!("Waiting for connection '{}' to close", target);
            tokio::time::sleep(WAIT_INTERVAL).await;
        }
        tracing::debug!("Connection '{}' is closed, proceeding", target);
    }
}
