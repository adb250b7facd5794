//! Entity Metadata - table, column and relation mapping for joinable entities
//!
//! An `EntityMetadata` is the opaque "repository type" a service is bound to.
//! Connections carry a catalog of them so that relation paths such as
//! `book.author` can be resolved to a target table and an ON clause.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{OrmError, OrmResult};

/// Defines the type of relationship between entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Many-to-one: the join column lives on the owning table
    BelongsTo,
    /// One-to-many: the join column lives on the related table
    HasMany,
    /// One-to-one with the join column on the related table
    HasOne,
}

impl RelationshipType {
    /// Returns true if the foreign key column is stored on the owning entity
    pub fn owns_foreign_key(self) -> bool {
        matches!(self, Self::BelongsTo)
    }

    /// Returns true if this relationship returns a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany)
    }
}

/// Mapping between a logical property and its physical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub property: String,
    pub column: String,
}

/// A relation declared on an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMapping {
    /// Name of the relation (property on the owning entity)
    pub name: String,

    pub relationship_type: RelationshipType,

    /// Entity name of the related side
    pub related_entity: String,

    /// Foreign key column. On the owner for `BelongsTo`, on the related table otherwise.
    pub join_column: String,

    /// Column the foreign key points at. On the related table for `BelongsTo`, on the owner otherwise.
    pub referenced_column: String,
}

/// Table-level metadata for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    pub table: String,
    pub primary_key: String,
    pub columns: Vec<ColumnMetadata>,
    pub relations: Vec<RelationMapping>,
}

impl EntityMetadata {
    /// Create metadata for an entity whose table carries the same name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table: name.clone(),
            name,
            primary_key: "id".to_string(),
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Add a column whose property name equals its column name
    pub fn column(self, name: &str) -> Self {
        self.column_as(name, name)
    }

    /// Add a column with a distinct property name
    pub fn column_as(mut self, property: &str, column: &str) -> Self {
        if !self.columns.iter().any(|c| c.property == property) {
            self.columns.push(ColumnMetadata {
                property: property.to_string(),
                column: column.to_string(),
            });
        }
        self
    }

    /// Many-to-one relation; `join_column` is added to the selected columns
    pub fn belongs_to(mut self, name: &str, related_entity: &str, join_column: &str, referenced_column: &str) -> Self {
        self.relations.push(RelationMapping {
            name: name.to_string(),
            relationship_type: RelationshipType::BelongsTo,
            related_entity: related_entity.to_string(),
            join_column: join_column.to_string(),
            referenced_column: referenced_column.to_string(),
        });
        self.column(join_column)
    }

    /// One-to-many relation; `join_column` lives on the related table
    pub fn has_many(mut self, name: &str, related_entity: &str, join_column: &str, referenced_column: &str) -> Self {
        self.relations.push(RelationMapping {
            name: name.to_string(),
            relationship_type: RelationshipType::HasMany,
            related_entity: related_entity.to_string(),
            join_column: join_column.to_string(),
            referenced_column: referenced_column.to_string(),
        });
        self
    }

    /// One-to-one relation; `join_column` lives on the related table
    pub fn has_one(mut self, name: &str, related_entity: &str, join_column: &str, referenced_column: &str) -> Self {
        self.relations.push(RelationMapping {
            name: name.to_string(),
            relationship_type: RelationshipType::HasOne,
            related_entity: related_entity.to_string(),
            join_column: join_column.to_string(),
            referenced_column: referenced_column.to_string(),
        });
        self
    }

    pub fn relation(&self, name: &str) -> Option<&RelationMapping> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Physical column for a property; column names resolve to themselves
    pub fn column_name<'a>(&'a self, property: &'a str) -> &'a str {
        self.columns
            .iter()
            .find(|c| c.property == property)
            .map(|c| c.column.as_str())
            .unwrap_or(property)
    }

    /// Validate the metadata for consistency
    pub fn validate(&self) -> OrmResult<()> {
        if self.name.is_empty() || self.table.is_empty() {
            return Err(OrmError::Configuration("Entity name and table cannot be empty".to_string()));
        }

        for relation in &self.relations {
            if relation.join_column.is_empty() || relation.referenced_column.is_empty() {
                return Err(OrmError::Configuration(format!(
                    "Relation '{}' on '{}' is missing its join columns",
                    relation.name, self.name
                )));
            }
        }
        Ok(())
    }
}

/// Entity-name keyed set of metadata known to a connection
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entities: HashMap<String, Arc<EntityMetadata>>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity; an existing entry with the same name is kept
    pub fn insert(&mut self, entity: Arc<EntityMetadata>) {
        self.entities.entry(entity.name.clone()).or_insert(entity);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<EntityMetadata>> {
        self.entities.get(name)
    }

    pub fn contains(&self, entity: &EntityMetadata) -> bool {
        self.entities
            .get(&entity.name)
            .map(|known| known.as_ref() == entity)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<Arc<EntityMetadata>> for EntityCatalog {
    fn from_iter<I: IntoIterator<Item = Arc<EntityMetadata>>>(iter: I) -> Self {
        let mut catalog = EntityCatalog::new();
        for entity in iter {
            catalog.insert(entity);
        }
        catalog
    }
}
