//! Explicit relationship extraction from declared keys.

use super::{component_table_names, LinkKind, Relationship};
use crate::schema::{Key, Table};
use ahash::{AHashMap, AHashSet};
use tracing::debug;

/// Declared relationships of a component plus the bookkeeping the
/// implied-link pass needs
#[derive(Debug, Clone, Default)]
pub struct ExplicitLinks {
    /// Relationships in table order, then key order
    pub relationships: Vec<Relationship>,
    /// Referenced tables outside the component, deduplicated, in discovery order
    pub external_tables: Vec<String>,
    /// Fields that carry a declared link, by table
    linked_fields: AHashMap<String, AHashSet<String>>,
}

impl ExplicitLinks {
    /// Whether `table.field` already has a declared link
    pub fn has_link(&self, table: &str, field: &str) -> bool {
        self.linked_fields
            .get(table)
            .is_some_and(|fields| fields.contains(field))
    }

    fn record(&mut self, rel: Relationship) {
        if rel.is_external() && !self.external_tables.contains(&rel.to_table) {
            debug!(table = %rel.to_table, "external table discovered");
            self.external_tables.push(rel.to_table.clone());
        }

        self.linked_fields
            .entry(rel.from_table.clone())
            .or_default()
            .insert(rel.from_field.clone());
        self.relationships.push(rel);
    }
}

/// Relationships declared by one table's non-primary keys.
///
/// Keys without a target table, local fields or target fields cannot be
/// linked and are skipped. Multi-column keys are summarised by their first
/// local and first target field.
pub fn table_references<'a>(
    table: &'a Table,
    component: &'a AHashSet<&'a str>,
) -> impl Iterator<Item = Relationship> + 'a {
    table
        .non_primary_keys()
        .filter_map(move |key| key_relationship(table, key, component))
}

fn key_relationship(table: &Table, key: &Key, component: &AHashSet<&str>) -> Option<Relationship> {
    let (Some(from_field), Some(to_table), Some(to_field)) = (
        key.fields.first(),
        key.ref_table.as_deref(),
        key.ref_fields.first(),
    ) else {
        debug!(table = %table.name, key = %key.name, "key has no usable link target, skipped");
        return None;
    };

    let kind = if component.contains(to_table) {
        LinkKind::Internal
    } else {
        LinkKind::External
    };

    Some(Relationship {
        from_table: table.name.clone(),
        from_field: from_field.clone(),
        to_table: to_table.to_string(),
        to_field: to_field.clone(),
        kind,
    })
}

/// Extract every declared relationship of the component's tables
pub fn extract_references(tables: &[Table]) -> ExplicitLinks {
    let component = component_table_names(tables);
    let mut links = ExplicitLinks::default();

    for table in tables {
        for rel in table_references(table, &component) {
            links.record(rel);
        }
    }

    links
}
