//! Query Builder - Core builder implementation

use std::fmt;
use std::sync::Arc;

use super::predicate::{AliasResolver, Predicate};
use super::types::*;
use crate::backends::SqlDialect;
use crate::connection::Connection;
use crate::error::{OrmError, OrmResult};
use crate::metadata::{EntityCatalog, EntityMetadata};

/// SELECT query builder rooted at one entity alias
///
/// Joins resolve relation paths (`alias.relation`) against the entity catalog,
/// so a builder can only join entities its catalog knows about. Builders
/// obtained from a `Repository` are bound to the connection and can execute.
#[derive(Clone)]
pub struct SelectQueryBuilder {
    pub(crate) connection: Option<Arc<Connection>>,
    pub(crate) catalog: Arc<EntityCatalog>,
    pub(crate) dialect: SqlDialect,
    pub(crate) entity: Arc<EntityMetadata>,
    pub(crate) alias: String,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) where_conditions: Vec<Predicate>,
    pub(crate) order_by: Vec<OrderClause>,
    pub(crate) parameters: Parameters,
}

impl SelectQueryBuilder {
    /// Create a detached builder, useful for rendering without a connection
    pub fn new(
        entity: Arc<EntityMetadata>,
        alias: &str,
        catalog: Arc<EntityCatalog>,
        dialect: SqlDialect,
    ) -> OrmResult<Self> {
        if alias.is_empty() {
            return Err(OrmError::missing_alias());
        }

        Ok(Self {
            connection: None,
            catalog,
            dialect,
            entity,
            alias: alias.to_string(),
            joins: Vec::new(),
            where_conditions: Vec::new(),
            order_by: Vec::new(),
            parameters: Parameters::new(),
        })
    }

    pub(crate) fn bind(mut self, connection: Arc<Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Root alias of the query
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Root entity of the query
    pub fn entity(&self) -> &EntityMetadata {
        &self.entity
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn connection(&self) -> Option<&Arc<Connection>> {
        self.connection.as_ref()
    }

    /// Aliases of every join added so far, in join order
    pub fn join_aliases(&self) -> Vec<&str> {
        self.joins.iter().map(|join| join.alias.as_str()).collect()
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.alias == alias || self.joins.iter().any(|join| join.alias == alias)
    }
}

impl AliasResolver for SelectQueryBuilder {
    fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    fn entity_for_alias(&self, alias: &str) -> Option<&EntityMetadata> {
        if self.alias == alias {
            return Some(&self.entity);
        }
        self.joins
            .iter()
            .find(|join| join.alias == alias)
            .map(|join| join.entity.as_ref())
    }
}

impl fmt::Debug for SelectQueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectQueryBuilder")
            .field("entity", &self.entity.name)
            .field("alias", &self.alias)
            .field("joins", &self.join_aliases())
            .field("where_conditions", &self.where_conditions.len())
            .field("connection", &self.connection.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}
