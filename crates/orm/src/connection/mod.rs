//! Connection Management
//!
//! Named connections opened and tracked by the `ConnectionRegistry`, and the
//! per-entity `Repository` handles they hand out.

pub mod manager;
pub mod repository;

pub use manager::ConnectionRegistry;
pub use repository::Repository;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value as JsonValue;

use crate::backends::{DatabaseBackend, DatabaseBackendType, DatabasePool, DatabasePoolStats, DatabaseValue, SqlDialect};
use crate::config::ConnectionConfig;
use crate::error::OrmResult;
use crate::metadata::{EntityCatalog, EntityMetadata};

/// An open (or closed) database connection registered under a name
pub struct Connection {
    name: String,
    config: ConnectionConfig,
    backend_type: DatabaseBackendType,
    dialect: SqlDialect,
    pool: Arc<dyn DatabasePool>,
    catalog: Arc<EntityCatalog>,
    connected: AtomicBool,
}

impl Connection {
    pub(crate) fn new(
        config: ConnectionConfig,
        backend: &dyn DatabaseBackend,
        pool: Arc<dyn DatabasePool>,
        catalog: Arc<EntityCatalog>,
    ) -> Self {
        Self {
            name: config.name.clone(),
            config,
            backend_type: backend.backend_type(),
            dialect: backend.sql_dialect(),
            pool,
            catalog,
            connected: AtomicBool::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration the connection was opened with, entities included
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn backend_type(&self) -> DatabaseBackendType {
        self.backend_type
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn catalog(&self) -> &Arc<EntityCatalog> {
        &self.catalog
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.pool.is_closed()
    }

    /// Repository for an entity mapped on this connection
    ///
    /// `None` when the connection is closed or the entity is not part of its
    /// catalog.
    pub fn get_repository(self: &Arc<Self>, entity: &EntityMetadata) -> Option<Repository> {
        if !self.is_connected() {
            return None;
        }

        self.catalog
            .get(&entity.name)
            .filter(|known| known.as_ref() == entity)
            .map(|known| Repository::new(self.clone(), known.clone()))
    }

    pub async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        self.pool.execute(sql, params).await
    }

    pub async fn query(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<JsonValue>> {
        self.pool.fetch_all(sql, params).await
    }

    pub async fn query_scalar(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<i64> {
        self.pool.fetch_scalar(sql, params).await
    }

    pub fn stats(&self) -> DatabasePoolStats {
        self.pool.stats()
    }

    pub async fn health_check(&self) -> OrmResult<Duration> {
        self.pool.health_check().await
    }

    /// Marks the connection closed once the pool has shut down
    pub(crate) async fn close(&self) -> OrmResult<()> {
        self.pool.close().await?;
        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("backend_type", &self.backend_type)
            .field("entities", &self.catalog.len())
            .field("connected", &self.is_connected())
            .finish()
    }
}
