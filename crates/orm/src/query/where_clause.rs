//! Query Builder WHERE clause operations

use super::builder::SelectQueryBuilder;
use super::predicate::Predicate;
use super::types::*;
use crate::backends::DatabaseValue;

impl SelectQueryBuilder {
    /// Add a condition joined to the existing ones with AND
    pub fn and_where(&mut self, predicate: impl Into<Predicate>) -> &mut Self {
        let predicate = predicate.into();
        if !predicate.is_empty() {
            self.where_conditions.push(predicate);
        }
        self
    }

    /// Add a condition together with the parameters it references
    pub fn and_where_with(&mut self, predicate: impl Into<Predicate>, parameters: Parameters) -> &mut Self {
        self.parameters.extend(parameters);
        self.and_where(predicate)
    }

    pub fn set_parameter(&mut self, name: &str, value: impl Into<DatabaseValue>) -> &mut Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn set_parameters(&mut self, parameters: Parameters) -> &mut Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn get_parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The WHERE conditions as one conjunction, with the builder's parameters
    ///
    /// `None` when no condition was added. Ordering and joins are not part of
    /// the expression.
    pub fn where_expression(&self) -> Option<WhereExpression> {
        Predicate::all(self.where_conditions.iter().cloned()).map(|predicate| WhereExpression {
            predicate,
            parameters: self.parameters.clone(),
        })
    }
}
