//! Relation-aware join composition
//!
//! Parents are always joined (inner by default); children only when named in
//! `subitems` (left by default). Each joined relation is aliased by appending
//! its configured suffix to the current alias, and the related service is
//! asked to join its own relations in turn.

use super::definition::{ChildRelation, ParentRelation};
use super::entity_service::EntityService;
use super::options::{Eligibility, ExtraConditions, JoinCondition, JoinOptions};
use crate::error::{OrmError, OrmResult};
use crate::query::{JoinType, Parameters, Predicate, SelectQueryBuilder};

pub(crate) fn set_joins<S>(
    service: &S,
    alias: &str,
    builder: &mut SelectQueryBuilder,
    options: &JoinOptions,
    extra: &ExtraConditions,
) -> OrmResult<()>
where
    S: EntityService + ?Sized,
{
    if alias.is_empty() {
        return Err(OrmError::missing_alias());
    }

    let definition = service.definition();

    for parent in definition.parents() {
        let parent_alias = format!("{}{}", alias, parent.alias);
        match options.eligibility(&parent.name, &parent_alias) {
            Eligibility::Stop => break,
            Eligibility::Skip => {
                tracing::trace!("Skipping parent {}.{}", alias, parent.name);
                continue;
            }
            Eligibility::Eligible => {}
        }
        if is_origin(parent, options.origin.as_deref()) {
            tracing::trace!("Skipping parent {}.{}: traversal came from it", alias, parent.name);
            continue;
        }

        join_parent(service, alias, &parent_alias, parent, builder, options, extra)?;
    }

    let Some(subitems) = &options.subitems else {
        return Ok(());
    };

    for subitem in subitems {
        for child in definition.children() {
            let child_alias = format!("{}{}", alias, child.alias);
            match options.eligibility(&child.name, &child_alias) {
                Eligibility::Stop => break,
                Eligibility::Skip => continue,
                Eligibility::Eligible => {}
            }
            if child.name != *subitem {
                continue;
            }

            join_child(service, alias, &child_alias, child, builder, options, extra)?;
        }
    }

    Ok(())
}

fn is_origin(parent: &ParentRelation, origin: Option<&str>) -> bool {
    origin.is_some_and(|origin| parent.name == origin || origin.ends_with(&parent.alias))
}

fn join_parent<S>(
    service: &S,
    alias: &str,
    parent_alias: &str,
    parent: &ParentRelation,
    builder: &mut SelectQueryBuilder,
    options: &JoinOptions,
    extra: &ExtraConditions,
) -> OrmResult<()>
where
    S: EntityService + ?Sized,
{
    let parent_service = (parent.service)(service.connection_name())?;

    let mut join_type = parent.join_type.unwrap_or(JoinType::InnerJoinAndSelect);
    if join_type.is_inner() {
        if let Some(forwarded) = options.join_type {
            join_type = forwarded;
        }
    }

    let mut scoped = parent_service.get_repository()?.create_query_builder(parent_alias)?;
    if !parent.dependent && join_type.is_left() {
        parent_service.set_default_query(parent_alias, &mut scoped)?;
    }
    let extra_condition = extra.get(&format!("{}.{}", alias, parent.name));
    if let Some(condition) = extra_condition {
        scoped.and_where(condition.predicate.clone());
    }

    let (condition, parameters) = join_condition(&scoped, extra_condition);
    builder.join(join_type, &format!("{}.{}", alias, parent.name), parent_alias, condition, parameters)?;

    let parent_options = JoinOptions {
        origin: Some(alias.to_string()),
        join_type: Some(join_type),
        subitems: parent.subitems.clone(),
        ignore: options.ignore.clone(),
        only: parent.only.clone(),
        only_policy: options.only_policy,
    };
    parent_service.set_joins(parent_alias, builder, &parent_options, extra)?;

    if parent.dependent && join_type.is_inner() {
        tracing::trace!("Applying default query of {} to the outer query", parent_alias);
        parent_service.set_default_query(parent_alias, builder)?;
    }

    Ok(())
}

fn join_child<S>(
    service: &S,
    alias: &str,
    child_alias: &str,
    child: &ChildRelation,
    builder: &mut SelectQueryBuilder,
    options: &JoinOptions,
    extra: &ExtraConditions,
) -> OrmResult<()>
where
    S: EntityService + ?Sized,
{
    let child_service = (child.service)(service.connection_name())?;

    let mut join_type = child.join_type.unwrap_or(JoinType::LeftJoinAndSelect);
    if join_type.is_left() {
        if let Some(forwarded) = options.join_type {
            join_type = forwarded;
        }
    }

    let mut scoped = child_service.get_repository()?.create_query_builder(child_alias)?;
    if join_type.is_left() {
        child_service.set_default_query(child_alias, &mut scoped)?;
    }
    if let Some(predicate) = &child.and_where {
        scoped.and_where(predicate.clone());
    }
    let extra_condition = extra.get(&format!("{}.{}", alias, child.name));
    if let Some(condition) = extra_condition {
        scoped.and_where(condition.predicate.clone());
    }

    let (condition, parameters) = join_condition(&scoped, extra_condition);
    builder.join(join_type, &format!("{}.{}", alias, child.name), child_alias, condition, parameters)?;

    let child_options = JoinOptions {
        origin: Some(alias.to_string()),
        join_type: Some(if join_type.is_left() { join_type } else { JoinType::LeftJoinAndSelect }),
        subitems: child.subitems.clone(),
        ignore: options.ignore.clone(),
        only: child.only.clone(),
        only_policy: options.only_policy,
    };
    child_service.set_joins(child_alias, builder, &child_options, extra)
}

/// WHERE of the scoped builder as an ON condition; extra parameters win
fn join_condition(scoped: &SelectQueryBuilder, extra: Option<&JoinCondition>) -> (Option<Predicate>, Parameters) {
    match scoped.where_expression() {
        Some(expression) => {
            let mut parameters = expression.parameters;
            if let Some(extra) = extra {
                parameters.extend(extra.parameters.clone());
            }
            (Some(expression.predicate), parameters)
        }
        None => (None, Parameters::new()),
    }
}
