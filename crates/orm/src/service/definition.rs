//! Service definitions
//!
//! A `ServiceDefinition` is the static part of an entity service: the entity
//! it serves, the connection it runs on, its soft-delete column, its default
//! sorting and the parent/child relations it may join.

use std::fmt;
use std::sync::Arc;

use super::registry::ServiceLookup;
use super::sorting::Sorting;
use crate::error::{OrmError, OrmResult};
use crate::metadata::EntityMetadata;
use crate::query::{JoinType, OrderDirection, Predicate};

const DEFAULT_DELETED_AT_FIELD: &str = "deleted_at";

/// Relation to an entity the served entity belongs to
#[derive(Clone)]
pub struct ParentRelation {
    /// Relation property on the served entity
    pub name: String,
    /// Suffix appended to the current alias to alias the joined parent
    pub alias: String,
    pub service: ServiceLookup,
    /// Defaults to `InnerJoinAndSelect`
    pub join_type: Option<JoinType>,
    /// Apply the parent's default query as an outer WHERE instead of in the ON clause
    pub dependent: bool,
    /// Child relations of the parent to include
    pub subitems: Option<Vec<String>>,
    /// `only` list forwarded to the parent's own traversal
    pub only: Option<Vec<String>>,
}

impl ParentRelation {
    pub fn new(name: impl Into<String>, alias: impl Into<String>, service: ServiceLookup) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            service,
            join_type: None,
            dependent: false,
            subitems: None,
            only: None,
        }
    }

    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = Some(join_type);
        self
    }

    pub fn dependent(mut self, dependent: bool) -> Self {
        self.dependent = dependent;
        self
    }

    pub fn subitems<I, T>(mut self, subitems: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.subitems = Some(subitems.into_iter().map(Into::into).collect());
        self
    }

    pub fn only<I, T>(mut self, only: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.only = Some(only.into_iter().map(Into::into).collect());
        self
    }
}

impl fmt::Debug for ParentRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentRelation")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("join_type", &self.join_type)
            .field("dependent", &self.dependent)
            .field("subitems", &self.subitems)
            .field("only", &self.only)
            .finish_non_exhaustive()
    }
}

/// Relation to entities that belong to the served entity
#[derive(Clone)]
pub struct ChildRelation {
    pub name: String,
    pub alias: String,
    pub service: ServiceLookup,
    /// Defaults to `LeftJoinAndSelect`
    pub join_type: Option<JoinType>,
    /// Extra condition placed in the join's ON clause
    pub and_where: Option<Predicate>,
    pub subitems: Option<Vec<String>>,
    pub only: Option<Vec<String>>,
}

impl ChildRelation {
    pub fn new(name: impl Into<String>, alias: impl Into<String>, service: ServiceLookup) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            service,
            join_type: None,
            and_where: None,
            subitems: None,
            only: None,
        }
    }

    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = Some(join_type);
        self
    }

    pub fn and_where(mut self, predicate: impl Into<Predicate>) -> Self {
        self.and_where = Some(predicate.into());
        self
    }

    pub fn subitems<I, T>(mut self, subitems: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.subitems = Some(subitems.into_iter().map(Into::into).collect());
        self
    }

    pub fn only<I, T>(mut self, only: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.only = Some(only.into_iter().map(Into::into).collect());
        self
    }
}

impl fmt::Debug for ChildRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRelation")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("join_type", &self.join_type)
            .field("and_where", &self.and_where)
            .field("subitems", &self.subitems)
            .field("only", &self.only)
            .finish_non_exhaustive()
    }
}

/// Static configuration of an entity service
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    repository: Arc<EntityMetadata>,
    connection_name: String,
    deleted_at_field: Option<String>,
    default_sorting: Sorting,
    parents: Vec<ParentRelation>,
    children: Vec<ChildRelation>,
}

impl ServiceDefinition {
    pub fn builder() -> ServiceDefinitionBuilder {
        ServiceDefinitionBuilder::default()
    }

    pub fn repository(&self) -> &Arc<EntityMetadata> {
        &self.repository
    }

    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    /// Soft-delete property; `None` disables the default filter
    pub fn deleted_at_field(&self) -> Option<&str> {
        self.deleted_at_field.as_deref()
    }

    /// Default sort with `$alias` placeholders
    pub fn default_sorting(&self) -> &Sorting {
        &self.default_sorting
    }

    pub fn parents(&self) -> &[ParentRelation] {
        &self.parents
    }

    pub fn children(&self) -> &[ChildRelation] {
        &self.children
    }
}

/// Builder for `ServiceDefinition`
#[derive(Debug, Clone)]
pub struct ServiceDefinitionBuilder {
    repository: Option<Arc<EntityMetadata>>,
    connection_name: Option<String>,
    deleted_at_field: Option<String>,
    default_sorting: Sorting,
    parents: Vec<ParentRelation>,
    children: Vec<ChildRelation>,
}

impl Default for ServiceDefinitionBuilder {
    fn default() -> Self {
        Self {
            repository: None,
            connection_name: None,
            deleted_at_field: Some(DEFAULT_DELETED_AT_FIELD.to_string()),
            default_sorting: Sorting::new(),
            parents: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl ServiceDefinitionBuilder {
    pub fn repository(mut self, entity: Arc<EntityMetadata>) -> Self {
        self.repository = Some(entity);
        self
    }

    pub fn connection_name(mut self, name: impl Into<String>) -> Self {
        self.connection_name = Some(name.into());
        self
    }

    pub fn deleted_at_field(mut self, field: impl Into<String>) -> Self {
        self.deleted_at_field = Some(field.into());
        self
    }

    pub fn without_soft_delete(mut self) -> Self {
        self.deleted_at_field = None;
        self
    }

    /// Add a default sort entry; `$alias` is replaced by the alias in use
    pub fn default_sort(mut self, expression: impl Into<String>, direction: OrderDirection) -> Self {
        self.default_sorting.insert(expression, direction);
        self
    }

    pub fn parent(mut self, parent: ParentRelation) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn child(mut self, child: ChildRelation) -> Self {
        self.children.push(child);
        self
    }

    pub fn build(self) -> OrmResult<ServiceDefinition> {
        let repository = self
            .repository
            .ok_or_else(|| OrmError::Argument("Repository type was not provided.".to_string()))?;

        let connection_name = self
            .connection_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| OrmError::Argument("Connection name was not provided.".to_string()))?;

        Ok(ServiceDefinition {
            repository,
            connection_name,
            deleted_at_field: self.deleted_at_field.filter(|field| !field.is_empty()),
            default_sorting: self.default_sorting,
            parents: self.parents,
            children: self.children,
        })
    }
}
