//! SQLite Backend Implementation
//!
//! Mirrors the PostgreSQL backend on top of `sqlx::SqlitePool`. Used for
//! embedded deployments and for the integration fixtures.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Pool, Row, Sqlite, TypeInfo, ValueRef};

use super::core::*;
use crate::error::{OrmError, OrmResult};

/// SQLite database backend implementation
#[derive(Debug)]
pub struct SqliteBackend;

impl SqliteBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SqliteBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseBackend for SqliteBackend {
    async fn create_pool(&self, database_url: &str, config: &DatabasePoolConfig) -> OrmResult<Arc<dyn DatabasePool>> {
        self.validate_database_url(database_url)?;

        let mut options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .test_before_acquire(config.test_before_acquire)
            .idle_timeout(config.idle_timeout_seconds.map(Duration::from_secs))
            .max_lifetime(config.max_lifetime_seconds.map(Duration::from_secs));

        // In-memory databases live and die with their single connection.
        if database_url.contains(":memory:") || database_url.contains("mode=memory") {
            options = options.max_connections(1).idle_timeout(None).max_lifetime(None);
        }

        let sqlx_pool = options
            .connect(database_url)
            .await
            .map_err(|e| OrmError::Connection(format!("Failed to create SQLite pool: {}", e)))?;

        Ok(Arc::new(SqlitePool::new(sqlx_pool)))
    }

    fn sql_dialect(&self) -> SqlDialect {
        SqlDialect::SQLite
    }

    fn backend_type(&self) -> crate::backends::DatabaseBackendType {
        crate::backends::DatabaseBackendType::SQLite
    }

    fn validate_database_url(&self, url: &str) -> OrmResult<()> {
        if !url.starts_with("sqlite:") {
            return Err(OrmError::Connection("Invalid SQLite URL scheme".to_string()));
        }
        Ok(())
    }
}

/// SQLite connection pool implementation
pub struct SqlitePool {
    pool: Pool<Sqlite>,
}

impl SqlitePool {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn build<'q>(sql: &'q str, params: &[DatabaseValue]) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }
        query
    }
}

#[async_trait]
impl DatabasePool for SqlitePool {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        let result = Self::build(sql, params)
            .execute(&self.pool)
            .await
            .map_err(|e| OrmError::Query(format!("Query execution failed: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<JsonValue>> {
        let rows = Self::build(sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| OrmError::Query(format!("Query fetch failed: {}", e)))?;

        rows.iter().map(row_to_json).collect()
    }

    async fn fetch_scalar(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<i64> {
        let row = Self::build(sql, params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| OrmError::Query(format!("Query fetch failed: {}", e)))?;

        row.try_get::<i64, _>(0)
            .map_err(|e| OrmError::Query(format!("Failed to read scalar value: {}", e)))
    }

    async fn close(&self) -> OrmResult<()> {
        self.pool.close().await;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    fn stats(&self) -> DatabasePoolStats {
        let total = self.pool.size();
        let idle = self.pool.num_idle() as u32;

        DatabasePoolStats {
            total_connections: total,
            idle_connections: idle,
            active_connections: total.saturating_sub(idle),
        }
    }

    async fn health_check(&self) -> OrmResult<Duration> {
        let start = Instant::now();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| OrmError::Connection(format!("Health check failed: {}", e)))?;

        Ok(start.elapsed())
    }
}

fn bind_database_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &DatabaseValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Bytes(b) => query.bind(b.clone()),
        DatabaseValue::DateTime(dt) => query.bind(*dt),
        DatabaseValue::Json(j) => query.bind(j.to_string()),
    }
}

fn row_to_json(row: &SqliteRow) -> OrmResult<JsonValue> {
    let mut map = serde_json::Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), column_value(row, index)?.to_json());
    }
    Ok(JsonValue::Object(map))
}

/// SQLite values are dynamically typed, so the declared type is only a hint.
fn column_value(row: &SqliteRow, index: usize) -> OrmResult<DatabaseValue> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| OrmError::Query(format!("Failed to read column {}: {}", index, e)))?;
    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOLEAN" => row.try_get::<bool, _>(index).ok().map(DatabaseValue::Bool),
        "INTEGER" | "INT8" | "BIGINT" => row.try_get::<i64, _>(index).ok().map(DatabaseValue::Int64),
        "REAL" => row.try_get::<f64, _>(index).ok().map(DatabaseValue::Float64),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).ok().map(DatabaseValue::Bytes),
        _ => None,
    };

    match value {
        Some(value) => Ok(value),
        None => row
            .try_get::<String, _>(index)
            .map(DatabaseValue::String)
            .map_err(|e| OrmError::Query(format!("Failed to get {} value: {}", type_name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_pool_roundtrip() {
        let backend = SqliteBackend::new();
        let pool = backend
            .create_pool("sqlite::memory:", &DatabasePoolConfig::default())
            .await
            .unwrap();

        pool.execute("CREATE TABLE items (id INTEGER PRIMARY KEY, label TEXT)", &[])
            .await
            .unwrap();
        pool.execute("INSERT INTO items (label) VALUES (?)", &[DatabaseValue::from("one")])
            .await
            .unwrap();

        assert_eq!(pool.fetch_scalar("SELECT COUNT(*) FROM items", &[]).await.unwrap(), 1);

        let rows = pool.fetch_all("SELECT id, label FROM items", &[]).await.unwrap();
        assert_eq!(rows, vec![serde_json::json!({ "id": 1, "label": "one" })]);

        pool.close().await.unwrap();
        assert!(pool.is_closed());
    }

    #[test]
    fn test_rejects_foreign_scheme() {
        assert!(SqliteBackend::new().validate_database_url("postgres://h/db").is_err());
    }
}
