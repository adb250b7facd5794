//! Structured WHERE / ON predicates
//!
//! Services compose join conditions as predicate trees and hand them to the
//! outer builder, which renders them once when the final SQL is produced.
//! Raw fragments keep their text; `alias.property` references in them are
//! quoted and mapped to physical columns for every alias the rendering
//! builder knows about.

use std::fmt;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::backends::SqlDialect;
use crate::metadata::EntityMetadata;

static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)").expect("reference pattern is valid")
});

static OR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bor\b").expect("OR pattern is valid"));

/// A boolean condition attached to a WHERE clause or a join
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `alias.property IS NULL`, the soft-delete filter
    IsNull { alias: String, property: String },
    /// Free-form SQL fragment, e.g. `book.id = :id`
    Raw(String),
    /// Conjunction of the contained predicates
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn is_null(alias: impl Into<String>, property: impl Into<String>) -> Self {
        Predicate::IsNull {
            alias: alias.into(),
            property: property.into(),
        }
    }

    pub fn raw(fragment: impl Into<String>) -> Self {
        Predicate::Raw(fragment.into())
    }

    /// Conjunction of `self` and `other`, flattening nested conjunctions
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::all([self, other]).unwrap_or(Predicate::And(Vec::new()))
    }

    /// Conjunction of every non-empty predicate; `None` if nothing remains
    pub fn all<I>(predicates: I) -> Option<Predicate>
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut flat = Vec::new();
        for predicate in predicates {
            predicate.flatten_into(&mut flat);
        }

        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Predicate::And(flat)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Predicate::IsNull { .. } => false,
            Predicate::Raw(fragment) => fragment.trim().is_empty(),
            Predicate::And(items) => items.iter().all(Predicate::is_empty),
        }
    }

    fn flatten_into(self, out: &mut Vec<Predicate>) {
        match self {
            Predicate::And(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
            predicate if predicate.is_empty() => {}
            predicate => out.push(predicate),
        }
    }

    /// Render to dialect SQL. `:name` parameters are left in place.
    pub(crate) fn render(&self, resolver: &dyn AliasResolver) -> String {
        match self {
            Predicate::IsNull { alias, property } => {
                let dialect = resolver.dialect();
                let column = resolver
                    .entity_for_alias(alias)
                    .map(|entity| entity.column_name(property))
                    .unwrap_or(property);
                format!("{}.{} IS NULL", dialect.escape(alias), dialect.escape(column))
            }
            Predicate::Raw(fragment) => rewrite_references(fragment.trim(), resolver),
            Predicate::And(items) => items
                .iter()
                .filter(|item| !item.is_empty())
                .map(|item| match item {
                    Predicate::Raw(fragment) if has_top_level_or(fragment) => {
                        format!("({})", item.render(resolver))
                    }
                    _ => item.render(resolver),
                })
                .collect::<Vec<_>>()
                .join(" AND "),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::IsNull { alias, property } => write!(f, "{}.{} IS NULL", alias, property),
            Predicate::Raw(fragment) => write!(f, "{}", fragment.trim()),
            Predicate::And(items) => {
                let rendered: Vec<String> = items
                    .iter()
                    .filter(|item| !item.is_empty())
                    .map(|item| match item {
                        Predicate::Raw(fragment) if has_top_level_or(fragment) => format!("({})", item),
                        _ => item.to_string(),
                    })
                    .collect();
                write!(f, "{}", rendered.join(" AND "))
            }
        }
    }
}

impl From<&str> for Predicate {
    fn from(fragment: &str) -> Self {
        Predicate::Raw(fragment.to_string())
    }
}

impl From<String> for Predicate {
    fn from(fragment: String) -> Self {
        Predicate::Raw(fragment)
    }
}

/// Alias lookups available while rendering
pub(crate) trait AliasResolver {
    fn dialect(&self) -> SqlDialect;
    fn entity_for_alias(&self, alias: &str) -> Option<&EntityMetadata>;
}

/// Quote `alias.property` references whose alias is known to the resolver
pub(crate) fn rewrite_references(text: &str, resolver: &dyn AliasResolver) -> String {
    let quoted = quoted_ranges(text);
    let dialect = resolver.dialect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;

    for caps in REFERENCE_RE.captures_iter(text) {
        let (Some(whole), Some(alias), Some(property)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if in_ranges(&quoted, whole.start()) || !starts_reference(text, whole.start()) {
            continue;
        }
        // schema-qualified function call
        if text[whole.end()..].starts_with('(') {
            continue;
        }
        let Some(entity) = resolver.entity_for_alias(alias.as_str()) else {
            continue;
        };

        out.push_str(&text[last..whole.start()]);
        out.push_str(&dialect.escape(alias.as_str()));
        out.push('.');
        out.push_str(&dialect.escape(entity.column_name(property.as_str())));
        last = whole.end();
    }

    out.push_str(&text[last..]);
    out
}

/// Byte ranges covered by string literals and quoted identifiers
pub(crate) fn quoted_ranges(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut index = 0;

    while index < bytes.len() {
        let quote = bytes[index];
        if quote != b'\'' && quote != b'"' && quote != b'`' {
            index += 1;
            continue;
        }

        let start = index;
        index += 1;
        loop {
            if index >= bytes.len() {
                break;
            }
            if bytes[index] == quote {
                // doubled quote is an escaped quote
                if index + 1 < bytes.len() && bytes[index + 1] == quote {
                    index += 2;
                    continue;
                }
                index += 1;
                break;
            }
            index += 1;
        }
        ranges.push(start..index);
    }

    ranges
}

pub(crate) fn in_ranges(ranges: &[Range<usize>], position: usize) -> bool {
    ranges.iter().any(|range| range.contains(&position))
}

fn starts_reference(text: &str, start: usize) -> bool {
    match text[..start].chars().last() {
        None => true,
        Some(c) => !(c.is_alphanumeric() || matches!(c, '_' | '.' | '"' | '`' | '\'' | ':' | '$' | '@')),
    }
}

fn has_top_level_or(fragment: &str) -> bool {
    let quoted = quoted_ranges(fragment);
    OR_RE
        .find_iter(fragment)
        .any(|m| !in_ranges(&quoted, m.start()))
}
