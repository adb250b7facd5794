//! The `EntityService` trait
//!
//! Every operation has a provided implementation driven by the service's
//! `ServiceDefinition`. A service customizes behavior by overriding a method
//! and, where it wants the stock behavior as well, calling the matching free
//! function (`default_query`, for instance) from its override.

use super::definition::ServiceDefinition;
use super::joins;
use super::options::{ExtraConditions, JoinOptions, SortOptions};
use super::sorting::{self, Sorting};
use crate::connection::{ConnectionRegistry, Repository};
use crate::error::{OrmError, OrmResult};
use crate::query::{Predicate, SelectQueryBuilder};

pub trait EntityService: Send + Sync + 'static {
    fn definition(&self) -> &ServiceDefinition;

    fn connection_name(&self) -> &str {
        self.definition().connection_name()
    }

    /// Repository of the served entity on the service's connection
    ///
    /// Fails when the connection is not registered, is closed, or does not
    /// map the entity.
    fn get_repository(&self) -> OrmResult<Repository> {
        repository(self.definition())
    }

    /// Join the configured parents and the requested children onto `builder`
    fn set_joins(
        &self,
        alias: &str,
        builder: &mut SelectQueryBuilder,
        options: &JoinOptions,
        extra: &ExtraConditions,
    ) -> OrmResult<()> {
        joins::set_joins(self, alias, builder, options, extra)
    }

    /// Apply the service's default restriction to `builder` under `alias`
    fn set_default_query(&self, alias: &str, builder: &mut SelectQueryBuilder) -> OrmResult<()> {
        default_query(self, alias, builder)
    }

    /// Default sorting of the service and its requested children, or the
    /// explicit sort translated to composed aliases
    fn get_sorting(&self, alias: &str, options: &SortOptions) -> OrmResult<Sorting> {
        sorting::get_sorting(self, alias, options)
    }

    /// Translate a logical path (`test2.test.id`) into a composed-alias path
    /// (`test2Test.id`); `None` when a relation segment is unknown
    fn translate_params(&self, param: &str, alias: Option<&str>) -> Option<String> {
        translate_params(self, param, alias)
    }
}

/// The stock default query: `<alias>.<deleted_at_field> IS NULL` when soft
/// delete is configured
pub fn default_query<S>(service: &S, alias: &str, builder: &mut SelectQueryBuilder) -> OrmResult<()>
where
    S: EntityService + ?Sized,
{
    if alias.is_empty() {
        return Err(OrmError::missing_alias());
    }

    if let Some(field) = service.definition().deleted_at_field() {
        builder.and_where(Predicate::is_null(alias, field));
    }
    Ok(())
}

fn repository(definition: &ServiceDefinition) -> OrmResult<Repository> {
    let connection = ConnectionRegistry::global()
        .get_connection(definition.connection_name())
        .ok_or_else(OrmError::repository_not_found)?;

    connection
        .get_repository(definition.repository())
        .ok_or_else(OrmError::repository_not_found)
}

pub(crate) fn translate_params<S>(service: &S, param: &str, alias: Option<&str>) -> Option<String>
where
    S: EntityService + ?Sized,
{
    if param.is_empty() {
        return Some(String::new());
    }

    let Some((field, rest)) = param.split_once('.') else {
        return Some(param.to_string());
    };
    let alias = alias.filter(|alias| !alias.is_empty()).unwrap_or(field);

    let Some((subfield, _)) = rest.split_once('.') else {
        return Some(format!("{}.{}", alias, rest));
    };

    let definition = service.definition();
    let (relation_alias, lookup) = definition
        .parents()
        .iter()
        .find(|parent| parent.name == subfield)
        .map(|parent| (parent.alias.as_str(), parent.service))
        .or_else(|| {
            definition
                .children()
                .iter()
                .find(|child| child.name == subfield)
                .map(|child| (child.alias.as_str(), child.service))
        })?;

    let related = match lookup(definition.connection_name()) {
        Ok(related) => related,
        Err(e) => {
            tracing::warn!("Cannot resolve service for relation '{}': {}", subfield, e);
            return None;
        }
    };

    related
        .translate_params(rest, Some(relation_alias))
        .filter(|translated| !translated.is_empty())
        .map(|translated| format!("{}{}", alias, translated))
}
