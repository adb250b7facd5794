//! Per-entity repository handle

use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::Connection;
use crate::backends::DatabaseValue;
use crate::error::OrmResult;
use crate::metadata::EntityMetadata;
use crate::query::SelectQueryBuilder;

/// Entity bound to a live connection
#[derive(Debug, Clone)]
pub struct Repository {
    connection: Arc<Connection>,
    entity: Arc<EntityMetadata>,
}

impl Repository {
    pub(crate) fn new(connection: Arc<Connection>, entity: Arc<EntityMetadata>) -> Self {
        Self { connection, entity }
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn entity(&self) -> &Arc<EntityMetadata> {
        &self.entity
    }

    /// SELECT builder rooted at this entity under `alias`
    pub fn create_query_builder(&self, alias: &str) -> OrmResult<SelectQueryBuilder> {
        let builder = SelectQueryBuilder::new(
            self.entity.clone(),
            alias,
            self.connection.catalog().clone(),
            self.connection.dialect(),
        )?;
        Ok(builder.bind(self.connection.clone()))
    }

    /// Run raw SQL on the repository's connection
    pub async fn query(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<JsonValue>> {
        self.connection.query(sql, params).await
    }

    pub async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        self.connection.execute(sql, params).await
    }
}
