//! ERD (Entity-Relationship Diagram) generation module.
//!
//! This module provides:
//! - Explicit relationship extraction from declared non-primary keys
//! - Implied relationship inference from field naming conventions
//! - Output formats: DOT (Graphviz) and JSON link listings
//!
//! Generation is a single pass over an immutable [`Schema`]; nothing is
//! shared between runs.

pub mod dot;
pub mod implicit;
pub mod json;
pub mod references;

pub use dot::to_dot;
pub use implicit::{infer_target, resolve_implicit, InferenceOptions, MatchPolicy};
pub use json::{to_json, LinksJson};
pub use references::{extract_references, table_references, ExplicitLinks};

use crate::schema::{Schema, Table};
use ahash::AHashSet;
use serde::Serialize;

/// Rendering options for diagram output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Show one row per field and attach edges to field ports
    pub include_field_detail: bool,
}

/// Classification of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Declared key targeting a table of the component
    Internal,
    /// Declared key targeting a table outside the component
    External,
    /// Inferred from field naming, always inside the component
    Implied,
}

/// A link from one table field to a field of another (or the same) table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub from_table: String,
    pub from_field: String,
    pub to_table: String,
    pub to_field: String,
    pub kind: LinkKind,
}

impl Relationship {
    pub fn is_implicit(&self) -> bool {
        self.kind == LinkKind::Implied
    }

    pub fn is_external(&self) -> bool {
        self.kind == LinkKind::External
    }

    pub fn is_self_reference(&self) -> bool {
        self.from_table == self.to_table
    }
}

/// Table names belonging to the component being diagrammed
pub fn component_table_names(tables: &[Table]) -> AHashSet<&str> {
    tables.iter().map(|t| t.name.as_str()).collect()
}

/// Every relationship found for one schema
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    /// Declared relationships in table/key order
    pub explicit: Vec<Relationship>,
    /// Inferred relationships in table/field order
    pub implicit: Vec<Relationship>,
    /// Referenced tables outside the component, in discovery order
    pub external_tables: Vec<String>,
}

impl Diagram {
    pub fn relationship_count(&self) -> usize {
        self.explicit.len() + self.implicit.len()
    }
}

/// Run extraction and inference over a schema
pub fn analyze(schema: &Schema, prefix: &str, inference: &InferenceOptions) -> Diagram {
    let explicit = extract_references(&schema.tables);
    let implicit = resolve_implicit(&schema.tables, &explicit, prefix, inference);

    Diagram {
        explicit: explicit.relationships,
        implicit,
        external_tables: explicit.external_tables,
    }
}

/// Analyze a schema and render it as DOT
pub fn generate(
    schema: &Schema,
    prefix: &str,
    inference: &InferenceOptions,
    options: RenderOptions,
) -> String {
    let diagram = analyze(schema, prefix, inference);
    to_dot(
        &schema.tables,
        &diagram.explicit,
        &diagram.implicit,
        &diagram.external_tables,
        options,
    )
}
