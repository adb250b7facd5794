//! Query Builder Module - SELECT builder driven by the entity services
//!
//! The builder is split across files by concern: construction, joins, WHERE
//! conditions, ordering, SQL rendering and execution all extend the same
//! `SelectQueryBuilder`.

pub mod builder;
pub mod execution;
pub mod joins;
pub mod ordering;
pub mod predicate;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::SelectQueryBuilder;
pub use predicate::Predicate;
pub use types::{JoinType, OrderDirection, Parameters, WhereExpression};
