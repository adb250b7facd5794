//! Entity Services
//!
//! Services describe how one entity relates to others and compose those
//! relations onto a `SelectQueryBuilder`: joins with per-relation default
//! restrictions, default sorting, and logical-path translation.

pub mod definition;
pub mod entity_service;
pub mod joins;
pub mod options;
pub mod registry;
pub mod sorting;

pub use definition::{ChildRelation, ParentRelation, ServiceDefinition, ServiceDefinitionBuilder};
pub use entity_service::{default_query, EntityService};
pub use options::{ExtraConditions, JoinCondition, JoinOptions, OnlyPolicy, SortOptions};
pub use registry::{install, instance, resolve, ServiceFactory, ServiceLookup};
pub use sorting::Sorting;
