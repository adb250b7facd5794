//! Query Builder ORDER BY operations

use super::builder::SelectQueryBuilder;
use super::types::*;

impl SelectQueryBuilder {
    /// Replace the ordering with a single expression
    pub fn order_by(&mut self, expression: &str, direction: OrderDirection) -> &mut Self {
        self.order_by.clear();
        self.add_order_by(expression, direction)
    }

    /// Append an ordering expression; an existing entry for it is updated in place
    pub fn add_order_by(&mut self, expression: &str, direction: OrderDirection) -> &mut Self {
        match self.order_by.iter_mut().find(|clause| clause.expression == expression) {
            Some(clause) => clause.direction = direction,
            None => self.order_by.push(OrderClause {
                expression: expression.to_string(),
                direction,
            }),
        }
        self
    }

    pub fn clear_order_by(&mut self) -> &mut Self {
        self.order_by.clear();
        self
    }
}
