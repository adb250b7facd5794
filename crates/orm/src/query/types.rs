//! Query Builder Types - Core types and enums for query building

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::predicate::Predicate;
use crate::backends::DatabaseValue;
use crate::metadata::{EntityMetadata, RelationMapping};

/// Named parameter values referenced as `:name` from predicate fragments
pub type Parameters = HashMap<String, DatabaseValue>;

/// Join variants exposed by the query builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinType {
    InnerJoin,
    InnerJoinAndSelect,
    LeftJoin,
    LeftJoinAndSelect,
}

impl JoinType {
    pub fn is_left(self) -> bool {
        matches!(self, JoinType::LeftJoin | JoinType::LeftJoinAndSelect)
    }

    pub fn is_inner(self) -> bool {
        matches!(self, JoinType::InnerJoin | JoinType::InnerJoinAndSelect)
    }

    /// Whether the joined entity's columns are added to the selection
    pub fn selects(self) -> bool {
        matches!(self, JoinType::InnerJoinAndSelect | JoinType::LeftJoinAndSelect)
    }

    pub(crate) fn keyword(self) -> &'static str {
        if self.is_left() {
            "LEFT JOIN"
        } else {
            "INNER JOIN"
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::InnerJoin => write!(f, "innerJoin"),
            JoinType::InnerJoinAndSelect => write!(f, "innerJoinAndSelect"),
            JoinType::LeftJoin => write!(f, "leftJoin"),
            JoinType::LeftJoinAndSelect => write!(f, "leftJoinAndSelect"),
        }
    }
}

impl FromStr for JoinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "innerJoin" => Ok(JoinType::InnerJoin),
            "innerJoinAndSelect" => Ok(JoinType::InnerJoinAndSelect),
            "leftJoin" => Ok(JoinType::LeftJoin),
            "leftJoinAndSelect" => Ok(JoinType::LeftJoinAndSelect),
            _ => Err(format!("Unsupported join type: {}", s)),
        }
    }
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// A conjunction of WHERE conditions together with the parameters they reference
#[derive(Debug, Clone, PartialEq)]
pub struct WhereExpression {
    pub predicate: Predicate,
    pub parameters: Parameters,
}

/// Join clause
#[derive(Debug, Clone)]
pub(crate) struct JoinClause {
    pub join_type: JoinType,
    pub entity: Arc<EntityMetadata>,
    pub alias: String,
    pub owner_alias: String,
    pub relation: RelationMapping,
    pub condition: Option<Predicate>,
}

/// ORDER BY entry; the expression may reference `alias.property` paths
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OrderClause {
    pub expression: String,
    pub direction: OrderDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_type_classification() {
        assert!(JoinType::LeftJoin.is_left());
        assert!(!JoinType::LeftJoin.selects());
        assert!(JoinType::InnerJoinAndSelect.is_inner());
        assert!(JoinType::InnerJoinAndSelect.selects());
        assert_eq!(JoinType::LeftJoinAndSelect.keyword(), "LEFT JOIN");
    }

    #[test]
    fn test_join_type_names() {
        assert_eq!(JoinType::InnerJoinAndSelect.to_string(), "innerJoinAndSelect");
        assert_eq!("leftJoin".parse::<JoinType>(), Ok(JoinType::LeftJoin));
        assert!("crossJoin".parse::<JoinType>().is_err());

        let parsed: JoinType = serde_json::from_str("\"leftJoinAndSelect\"").unwrap();
        assert_eq!(parsed, JoinType::LeftJoinAndSelect);
    }

    #[test]
    fn test_order_direction_serde() {
        assert_eq!(serde_json::to_string(&OrderDirection::Desc).unwrap(), "\"DESC\"");
        let parsed: OrderDirection = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(parsed, OrderDirection::Asc);
    }
}
