//! Sort specifications and their composition across related services

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::entity_service::EntityService;
use super::options::{Eligibility, SortOptions};
use crate::error::{OrmError, OrmResult};
use crate::query::{OrderDirection, SelectQueryBuilder};

/// Ordered map from `alias.property` to a direction
///
/// Insertion order is kept; inserting an existing key replaces its direction
/// without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sorting {
    entries: Vec<(String, OrderDirection)>,
}

impl Sorting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, direction: OrderDirection) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = direction,
            None => self.entries.push((key, direction)),
        }
    }

    /// Builder form of `insert`
    pub fn with(mut self, key: impl Into<String>, direction: OrderDirection) -> Self {
        self.insert(key, direction);
        self
    }

    pub fn get(&self, key: &str) -> Option<OrderDirection> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, direction)| *direction)
    }

    /// Merge `other` into this sorting, later keys winning
    pub fn merge(&mut self, other: Sorting) {
        for (key, direction) in other.entries {
            self.insert(key, direction);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, OrderDirection)> {
        self.entries.iter().map(|(key, direction)| (key.as_str(), *direction))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Append every entry to the builder's ORDER BY, in order
    pub fn apply_to<'q>(&self, builder: &'q mut SelectQueryBuilder) -> &'q mut SelectQueryBuilder {
        for (key, direction) in &self.entries {
            builder.add_order_by(key, *direction);
        }
        builder
    }
}

impl<K: Into<String>> FromIterator<(K, OrderDirection)> for Sorting {
    fn from_iter<I: IntoIterator<Item = (K, OrderDirection)>>(iter: I) -> Self {
        let mut sorting = Sorting::new();
        for (key, direction) in iter {
            sorting.insert(key, direction);
        }
        sorting
    }
}

impl IntoIterator for Sorting {
    type Item = (String, OrderDirection);
    type IntoIter = std::vec::IntoIter<(String, OrderDirection)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Sorting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, direction) in &self.entries {
            map.serialize_entry(key, direction)?;
        }
        map.end()
    }
}

struct SortingVisitor;

impl<'de> Visitor<'de> for SortingVisitor {
    type Value = Sorting;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of sort keys to ASC or DESC")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut sorting = Sorting::new();
        while let Some((key, direction)) = access.next_entry::<String, OrderDirection>()? {
            sorting.insert(key, direction);
        }
        Ok(sorting)
    }
}

impl<'de> Deserialize<'de> for Sorting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SortingVisitor)
    }
}

pub(crate) fn get_sorting<S>(service: &S, alias: &str, options: &SortOptions) -> OrmResult<Sorting>
where
    S: EntityService + ?Sized,
{
    if alias.is_empty() {
        return Err(OrmError::missing_alias());
    }

    if let Some(sort) = options.sort.as_ref().filter(|sort| !sort.is_empty()) {
        return Ok(translate_sort(service, sort));
    }

    let definition = service.definition();
    let mut sorting: Sorting = definition
        .default_sorting()
        .iter()
        .map(|(key, direction)| (key.replace("$alias", alias), direction))
        .collect();

    let Some(subitems) = &options.subitems else {
        return Ok(sorting);
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

            let child_service = (child.service)(definition.connection_name())?;
            let child_options = SortOptions {
                origin: Some(alias.to_string()),
                ignore: options.ignore.clone(),
                only: child.only.clone(),
                only_policy: options.only_policy,
                ..SortOptions::default()
            };
            sorting.merge(child_service.get_sorting(&child_alias, &child_options)?);
        }
    }

    Ok(sorting)
}

fn translate_sort<S>(service: &S, sort: &Sorting) -> Sorting
where
    S: EntityService + ?Sized,
{
    let mut translated = Sorting::new();
    for (key, direction) in sort.iter() {
        match service.translate_params(key, None) {
            Some(path) if !path.is_empty() => translated.insert(path, direction),
            _ => tracing::warn!("Dropping sort key '{}': no relation matches its path", key),
        }
    }
    translated
}
