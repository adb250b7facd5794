//! # joinwise-orm: relationship-aware query composition
//!
//! Per-entity services that know how their entity relates to others and
//! compose those relations onto a SELECT builder: parents and requested
//! children are joined under composed aliases, each joined entity's default
//! restriction (soft delete by default) lands in the join's ON clause, and
//! default sorting is merged across the requested children.
//!
//! Connections are opened by name through the `ConnectionRegistry`; services
//! resolve their repository from the connection they were created for.

pub mod backends;
pub mod config;
pub mod connection;
pub mod error;
pub mod metadata;
pub mod query;
pub mod service;

pub use backends::{DatabaseBackendType, DatabasePoolConfig, DatabaseValue, SqlDialect};
pub use config::ConnectionConfig;
pub use connection::{Connection, ConnectionRegistry, Repository};
pub use error::{ConfigError, OrmError, OrmResult};
pub use metadata::{EntityCatalog, EntityMetadata, RelationMapping, RelationshipType};
pub use query::{JoinType, OrderDirection, Parameters, Predicate, SelectQueryBuilder, WhereExpression};
pub use service::*;
