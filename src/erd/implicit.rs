//! Implied relationship inference.
//!
//! Many schemas leave links undeclared and rely on naming conventions
//! instead (`page.bookid` pointing at `book.id`). For every field without a
//! declared link, candidate table names are derived from the field name:
//!
//! 1. the field name itself (`book` -> `book`), unless it names the field's
//!    own table
//! 2. prefix + field name (`discussion` -> `forum_discussion`)
//! 3. for names ending in `id` (but not `id` itself), the stem
//!    (`bookid` -> `book`), the pluralised stem (`books`) and the prefixed
//!    plural (`postid` -> `forum_posts`)
//!
//! A candidate only counts if the component has a table of that name. The
//! [`MatchPolicy`] decides which accepted candidate wins.

use super::{component_table_names, ExplicitLinks, LinkKind, Relationship};
use crate::schema::{FieldType, Table};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Tie-break between several matching candidate tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// The most specific candidate (latest in evaluation order) wins
    #[default]
    Last,
    /// The first candidate in evaluation order wins
    First,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last" | "last-match" => Ok(MatchPolicy::Last),
            "first" | "first-match" => Ok(MatchPolicy::First),
            _ => Err(format!(
                "Unknown match policy: {}. Valid options: first, last",
                s
            )),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Last => write!(f, "last"),
            MatchPolicy::First => write!(f, "first"),
        }
    }
}

/// Settings for the implied-link pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceOptions {
    /// Run inference at all
    pub enabled: bool,
    pub policy: MatchPolicy,
    /// Only consider integer fields
    pub integer_only: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: MatchPolicy::default(),
            integer_only: false,
        }
    }
}

/// Candidate table names for a field of `table`, in evaluation order
fn candidate_names(field: &str, table: &str, prefix: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    if field != table {
        candidates.push(field.to_string());
    }
    if !prefix.is_empty() {
        candidates.push(format!("{}{}", prefix, field));
    }

    if field != "id" {
        if let Some(stem) = field.strip_suffix("id") {
            candidates.push(stem.to_string());
            candidates.push(format!("{}s", stem));
            if !prefix.is_empty() {
                candidates.push(format!("{}{}s", prefix, stem));
            }
        }
    }

    candidates
}

/// Guess the table a field of `table` refers to, if any
pub fn infer_target(
    field: &str,
    table: &str,
    component: &AHashSet<&str>,
    prefix: &str,
    policy: MatchPolicy,
) -> Option<String> {
    let mut matches = candidate_names(field, table, prefix)
        .into_iter()
        .filter(|name| component.contains(name.as_str()));

    match policy {
        MatchPolicy::First => matches.next(),
        MatchPolicy::Last => matches.last(),
    }
}

/// Infer relationships for every field that has no declared link.
/// Targets are always the `id` field of a component table.
pub fn resolve_implicit(
    tables: &[Table],
    explicit: &ExplicitLinks,
    prefix: &str,
    options: &InferenceOptions,
) -> Vec<Relationship> {
    if !options.enabled {
        return Vec::new();
    }

    let component = component_table_names(tables);
    let mut implied = Vec::new();

    for table in tables {
        for field in &table.fields {
            if explicit.has_link(&table.name, &field.name) {
                continue;
            }
            if options.integer_only && field.field_type != FieldType::Integer {
                continue;
            }

            let target =
                infer_target(&field.name, &table.name, &component, prefix, options.policy);
            if let Some(target) = target {
                debug!(table = %table.name, field = %field.name, %target, "implied link");
                implied.push(Relationship {
                    from_table: table.name.clone(),
                    from_field: field.name.clone(),
                    to_table: target,
                    to_field: "id".to_string(),
                    kind: LinkKind::Implied,
                });
            }
        }
    }

    implied
}
