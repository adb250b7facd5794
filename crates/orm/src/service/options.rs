//! Per-call options for join and sort composition

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::sorting::Sorting;
use crate::query::{JoinType, Parameters, Predicate};

/// How an `only` allow-list is applied to declared relations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnlyPolicy {
    /// Relations are scanned in declaration order and the scan stops at the
    /// first relation missing from the list, so only a leading run of
    /// allowed relations is kept.
    #[default]
    Prefix,
    /// Every relation missing from the list is skipped, wherever it is declared.
    Filter,
}

/// Extra condition for one relation, keyed `"<alias>.<relationName>"` in `ExtraConditions`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition {
    pub predicate: Predicate,
    pub parameters: Parameters,
}

impl JoinCondition {
    pub fn new(predicate: impl Into<Predicate>) -> Self {
        Self {
            predicate: predicate.into(),
            parameters: Parameters::new(),
        }
    }

    pub fn with_parameters(predicate: impl Into<Predicate>, parameters: Parameters) -> Self {
        Self {
            predicate: predicate.into(),
            parameters,
        }
    }
}

/// Extra join conditions by `"<alias>.<relationName>"`
pub type ExtraConditions = HashMap<String, JoinCondition>;

/// Outcome of the `only` / `ignore` checks for one relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Eligibility {
    Eligible,
    Skip,
    Stop,
}

fn eligibility(
    only: Option<&[String]>,
    only_policy: OnlyPolicy,
    ignore: Option<&[String]>,
    name: &str,
    composed_alias: &str,
) -> Eligibility {
    if let Some(only) = only {
        if !only.iter().any(|allowed| allowed == name) {
            return match only_policy {
                OnlyPolicy::Prefix => Eligibility::Stop,
                OnlyPolicy::Filter => Eligibility::Skip,
            };
        }
    }

    if let Some(ignore) = ignore {
        if ignore.iter().any(|ignored| ignored == composed_alias) {
            return Eligibility::Skip;
        }
    }

    Eligibility::Eligible
}

fn to_strings<I, T>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// Options for `EntityService::set_joins`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JoinOptions {
    /// Alias of the node the traversal came from
    pub origin: Option<String>,
    /// Join type forwarded to the relations of this level
    pub join_type: Option<JoinType>,
    /// Child relations to include by name
    pub subitems: Option<Vec<String>>,
    /// Composed aliases to leave out
    pub ignore: Option<Vec<String>>,
    /// Relation names allowed at this level
    pub only: Option<Vec<String>>,
    pub only_policy: OnlyPolicy,
}

impl JoinOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = Some(join_type);
        self
    }

    pub fn subitems<I, T>(mut self, subitems: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.subitems = Some(to_strings(subitems));
        self
    }

    pub fn ignore<I, T>(mut self, ignore: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.ignore = Some(to_strings(ignore));
        self
    }

    pub fn only<I, T>(mut self, only: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.only = Some(to_strings(only));
        self
    }

    pub fn only_policy(mut self, policy: OnlyPolicy) -> Self {
        self.only_policy = policy;
        self
    }

    pub(crate) fn eligibility(&self, name: &str, composed_alias: &str) -> Eligibility {
        eligibility(
            self.only.as_deref(),
            self.only_policy,
            self.ignore.as_deref(),
            name,
            composed_alias,
        )
    }
}

/// Options for `EntityService::get_sorting`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SortOptions {
    /// Explicit sort by logical path; when non-empty, defaults are not used
    pub sort: Option<Sorting>,
    pub origin: Option<String>,
    pub subitems: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub only: Option<Vec<String>>,
    pub only_policy: OnlyPolicy,
}

impl SortOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: Sorting) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn subitems<I, T>(mut self, subitems: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.subitems = Some(to_strings(subitems));
        self
    }

    pub fn ignore<I, T>(mut self, ignore: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.ignore = Some(to_strings(ignore));
        self
    }

    pub fn only<I, T>(mut self, only: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.only = Some(to_strings(only));
        self
    }

    pub fn only_policy(mut self, policy: OnlyPolicy) -> Self {
        self.only_policy = policy;
        self
    }

    pub(crate) fn eligibility(&self, name: &str, composed_alias: &str) -> Eligibility {
        eligibility(
            self.only.as_deref(),
            self.only_policy,
            self.ignore.as_deref(),
            name,
            composed_alias,
        )
    }
}
