//! Query Builder SQL generation

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::builder::SelectQueryBuilder;
use super::predicate::{in_ranges, quoted_ranges, rewrite_references, Predicate};
use super::types::*;
use crate::backends::{DatabaseValue, SqlDialect};
use crate::error::{OrmError, OrmResult};
use crate::metadata::{EntityMetadata, RelationshipType};

static PARAMETER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("parameter pattern is valid"));

impl SelectQueryBuilder {
    /// Rendered SQL with `:name` parameters left in place
    pub fn get_query(&self) -> String {
        let mut sql = format!("SELECT {}", self.build_selection());
        self.build_from_clause(&mut sql);
        self.build_order_clause(&mut sql);
        sql
    }

    /// Rendered SQL with dialect placeholders
    pub fn get_sql(&self) -> OrmResult<String> {
        self.get_query_and_parameters().map(|(sql, _)| sql)
    }

    /// Rendered SQL with dialect placeholders and the values in binding order
    pub fn get_query_and_parameters(&self) -> OrmResult<(String, Vec<DatabaseValue>)> {
        bind_named_parameters(&self.get_query(), self.dialect, &self.parameters)
    }

    /// Distinct root-row count over the same FROM / JOIN / WHERE clauses
    pub fn get_count_query_and_parameters(&self) -> OrmResult<(String, Vec<DatabaseValue>)> {
        let d = self.dialect;
        let mut sql = format!(
            "SELECT COUNT(DISTINCT({}.{})) AS {}",
            d.escape(&self.alias),
            d.escape(self.entity.column_name(&self.entity.primary_key)),
            d.escape("cnt")
        );
        self.build_from_clause(&mut sql);
        bind_named_parameters(&sql, self.dialect, &self.parameters)
    }

    fn build_selection(&self) -> String {
        let mut columns = select_columns(self.dialect, &self.alias, &self.entity);
        for join in self.joins.iter().filter(|join| join.join_type.selects()) {
            columns.extend(select_columns(self.dialect, &join.alias, &join.entity));
        }
        columns.join(", ")
    }

    fn build_from_clause(&self, sql: &mut String) {
        let d = self.dialect;
        sql.push_str(&format!(" FROM {} {}", d.escape(&self.entity.table), d.escape(&self.alias)));

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.join_type.keyword());
            sql.push_str(&format!(" {} {} ON {}", d.escape(&join.entity.table), d.escape(&join.alias), self.join_on(join)));

            if let Some(condition) = &join.condition {
                sql.push_str(&format!(" AND ({})", condition.render(self)));
            }
        }

        // one conjunction, so OR fragments get parenthesized
        if let Some(conditions) = Predicate::all(self.where_conditions.iter().cloned()) {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.render(self));
        }
    }

    fn build_order_clause(&self, sql: &mut String) {
        if self.order_by.is_empty() {
            return;
        }

        let orders: Vec<String> = self
            .order_by
            .iter()
            .map(|clause| format!("{} {}", rewrite_references(&clause.expression, self), clause.direction))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&orders.join(", "));
    }

    fn join_on(&self, join: &JoinClause) -> String {
        let d = self.dialect;
        let relation = &join.relation;
        let (joined_column, owner_column) = match relation.relationship_type {
            RelationshipType::BelongsTo => (&relation.referenced_column, &relation.join_column),
            RelationshipType::HasMany | RelationshipType::HasOne => (&relation.join_column, &relation.referenced_column),
        };

        format!(
            "{}.{}={}.{}",
            d.escape(&join.alias),
            d.escape(joined_column),
            d.escape(&join.owner_alias),
            d.escape(owner_column)
        )
    }
}

fn select_columns(dialect: SqlDialect, alias: &str, entity: &EntityMetadata) -> Vec<String> {
    entity
        .columns
        .iter()
        .map(|column| {
            format!(
                "{}.{} AS {}",
                dialect.escape(alias),
                dialect.escape(&column.column),
                dialect.escape(&format!("{}_{}", alias, column.column))
            )
        })
        .collect()
}

/// Replace `:name` parameters with dialect placeholders
///
/// PostgreSQL placeholders are numbered per distinct name; `?` dialects get
/// one value per occurrence. `::` casts and quoted text are left untouched.
pub(crate) fn bind_named_parameters(
    sql: &str,
    dialect: SqlDialect,
    parameters: &Parameters,
) -> OrmResult<(String, Vec<DatabaseValue>)> {
    let quoted = quoted_ranges(sql);
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut numbered: HashMap<&str, usize> = HashMap::new();
    let mut last = 0;

    for caps in PARAMETER_RE.captures_iter(sql) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if in_ranges(&quoted, whole.start()) || sql[..whole.start()].ends_with(':') {
            continue;
        }

        let value = parameters
            .get(name.as_str())
            .ok_or_else(|| OrmError::Query(format!("Missing value for parameter :{}", name.as_str())))?;

        let placeholder = match dialect {
            SqlDialect::PostgreSQL => {
                let index = match numbered.get(name.as_str()) {
                    Some(index) => *index,
                    None => {
                        values.push(value.clone());
                        numbered.insert(name.as_str(), values.len() - 1);
                        values.len() - 1
                    }
                };
                dialect.parameter_placeholder(index)
            }
            SqlDialect::MySQL | SqlDialect::SQLite => {
                values.push(value.clone());
                dialect.parameter_placeholder(values.len() - 1)
            }
        };

        out.push_str(&sql[last..whole.start()]);
        out.push_str(&placeholder);
        last = whole.end();
    }

    out.push_str(&sql[last..]);
    Ok((out, values))
}
