//! Error types for the ORM service layer
//!
//! Argument errors are raised before any work is done, connection errors come
//! from the registry and repository resolution, and everything the database
//! driver reports is folded into `Database`.

use thiserror::Error;

/// Result type alias for ORM operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrmError {
    /// A required argument was missing or empty
    #[error("{0}")]
    Argument(String),

    /// Connection open/close failure, or a repository that cannot be resolved
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query building or rendering error
    #[error("Query error: {0}")]
    Query(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error reported by the database driver
    #[error("Database error: {0}")]
    Database(String),
}

impl OrmError {
    pub(crate) fn missing_alias() -> Self {
        OrmError::Argument("Alias was not provided.".to_string())
    }

    pub(crate) fn repository_not_found() -> Self {
        OrmError::Connection("Connection or repository not found.".to_string())
    }
}

impl From<sqlx::Error> for OrmError {
    fn from(err: sqlx::Error) -> Self {
        OrmError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        OrmError::Query(err.to_string())
    }
}

impl From<ConfigError> for OrmError {
    fn from(err: ConfigError) -> Self {
        OrmError::Configuration(err.to_string())
    }
}

/// Errors raised while loading configuration from the environment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
}
