//! Query Builder execution against the bound connection

use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::builder::SelectQueryBuilder;
use crate::connection::Connection;
use crate::error::{OrmError, OrmResult};

impl SelectQueryBuilder {
    fn live_connection(&self) -> OrmResult<&Arc<Connection>> {
        match &self.connection {
            Some(connection) if connection.is_connected() => Ok(connection),
            Some(_) => Err(OrmError::repository_not_found()),
            None => Err(OrmError::Query("Query builder is not bound to a connection".to_string())),
        }
    }

    /// Count the distinct root rows matched by the query
    pub async fn get_count(&self) -> OrmResult<i64> {
        let connection = self.live_connection()?;
        let (sql, params) = self.get_count_query_and_parameters()?;
        tracing::debug!("Counting {} rows on connection '{}'", self.entity.name, connection.name());
        connection.query_scalar(&sql, &params).await
    }

    /// Execute the query and return every row as a JSON object keyed by `alias_column`
    pub async fn get_raw_many(&self) -> OrmResult<Vec<JsonValue>> {
        let connection = self.live_connection()?;
        let (sql, params) = self.get_query_and_parameters()?;
        connection.query(&sql, &params).await
    }

    /// First row of the query, if any
    pub async fn get_raw_one(&self) -> OrmResult<Option<JsonValue>> {
        let mut rows = self.get_raw_many().await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }
}
