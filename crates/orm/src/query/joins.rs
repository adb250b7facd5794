//! Query Builder JOIN operations

use super::builder::SelectQueryBuilder;
use super::predicate::{AliasResolver, Predicate};
use super::types::*;
use crate::error::{OrmError, OrmResult};

impl SelectQueryBuilder {
    /// INNER JOIN without selecting the joined columns
    pub fn inner_join(
        &mut self,
        relation_path: &str,
        alias: &str,
        condition: Option<Predicate>,
        parameters: Parameters,
    ) -> OrmResult<&mut Self> {
        self.join(JoinType::InnerJoin, relation_path, alias, condition, parameters)
    }

    /// INNER JOIN and select the joined columns
    pub fn inner_join_and_select(
        &mut self,
        relation_path: &str,
        alias: &str,
        condition: Option<Predicate>,
        parameters: Parameters,
    ) -> OrmResult<&mut Self> {
        self.join(JoinType::InnerJoinAndSelect, relation_path, alias, condition, parameters)
    }

    /// LEFT JOIN without selecting the joined columns
    pub fn left_join(
        &mut self,
        relation_path: &str,
        alias: &str,
        condition: Option<Predicate>,
        parameters: Parameters,
    ) -> OrmResult<&mut Self> {
        self.join(JoinType::LeftJoin, relation_path, alias, condition, parameters)
    }

    /// LEFT JOIN and select the joined columns
    pub fn left_join_and_select(
        &mut self,
        relation_path: &str,
        alias: &str,
        condition: Option<Predicate>,
        parameters: Parameters,
    ) -> OrmResult<&mut Self> {
        self.join(JoinType::LeftJoinAndSelect, relation_path, alias, condition, parameters)
    }

    /// Join the relation at `relation_path` (`<knownAlias>.<relationName>`) as `alias`
    ///
    /// The condition is appended to the relation's ON clause; its parameters
    /// are merged into the builder's parameter map.
    pub fn join(
        &mut self,
        join_type: JoinType,
        relation_path: &str,
        alias: &str,
        condition: Option<Predicate>,
        parameters: Parameters,
    ) -> OrmResult<&mut Self> {
        if alias.is_empty() {
            return Err(OrmError::missing_alias());
        }
        if self.has_alias(alias) {
            return Err(OrmError::Query(format!("Alias '{}' is already used in this query", alias)));
        }

        let (owner_alias, relation_name) = relation_path
            .split_once('.')
            .ok_or_else(|| OrmError::Query(format!("Invalid relation path '{}'", relation_path)))?;

        let owner = self
            .entity_for_alias(owner_alias)
            .ok_or_else(|| OrmError::Query(format!("Unknown alias '{}' in '{}'", owner_alias, relation_path)))?;

        let relation = owner.relation(relation_name).cloned().ok_or_else(|| {
            OrmError::Query(format!(
                "Relation '{}' is not declared on entity '{}'",
                relation_name, owner.name
            ))
        })?;

        let entity = self.catalog.get(&relation.related_entity).cloned().ok_or_else(|| {
            OrmError::Query(format!(
                "Entity '{}' is not registered on this connection",
                relation.related_entity
            ))
        })?;

        tracing::trace!("{} {} as {}", join_type, relation_path, alias);

        self.joins.push(JoinClause {
            join_type,
            entity,
            alias: alias.to_string(),
            owner_alias: owner_alias.to_string(),
            relation,
            condition: condition.filter(|predicate| !predicate.is_empty()),
        });
        self.parameters.extend(parameters);

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backends::{DatabaseValue, SqlDialect};
    use crate::metadata::{EntityCatalog, EntityMetadata};

    fn builder() -> SelectQueryBuilder {
        let author = Arc::new(EntityMetadata::new("Author").column("id").has_many("books", "Book", "author", "id"));
        let book = Arc::new(EntityMetadata::new("Book").column("id").belongs_to("author", "Author", "author", "id"));
        let catalog: EntityCatalog = vec![author.clone(), book].into_iter().collect();
        SelectQueryBuilder::new(author, "author", Arc::new(catalog), SqlDialect::SQLite).unwrap()
    }

    #[test]
    fn test_join_registers_alias_and_parameters() {
        let mut qb = builder();
        let mut params = Parameters::new();
        params.insert("id".to_string(), DatabaseValue::from(3_i64));

        qb.left_join_and_select("author.books", "authorBooks", Some("authorBooks.id = :id".into()), params)
            .unwrap()
            .inner_join("authorBooks.author", "authorBooksAuthor", None, Parameters::new())
            .unwrap();

        assert_eq!(qb.join_aliases(), vec!["authorBooks", "authorBooksAuthor"]);
        assert_eq!(qb.get_parameters().get("id"), Some(&DatabaseValue::Int64(3)));
    }

    #[test]
    fn test_join_rejects_unknown_relation_and_duplicate_alias() {
        let mut qb = builder();
        assert!(qb.inner_join("author.missing", "x", None, Parameters::new()).is_err());
        assert!(qb.inner_join("nobody.books", "x", None, Parameters::new()).is_err());
        assert!(qb.inner_join("author.books", "author", None, Parameters::new()).is_err());
        assert_eq!(
            qb.inner_join("author.books", "", None, Parameters::new()).err(),
            Some(OrmError::missing_alias())
        );
    }
}
