//! JSON format output for relationship listings.

use super::{Diagram, LinkKind, Relationship};
use crate::schema::Schema;
use serde::Serialize;

/// JSON representation of a component's links
#[derive(Debug, Serialize)]
pub struct LinksJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub prefix: String,
    pub relationships: Vec<Relationship>,
    pub external_tables: Vec<String>,
    pub stats: LinkStats,
}

/// Link statistics
#[derive(Debug, Serialize)]
pub struct LinkStats {
    pub table_count: usize,
    pub field_count: usize,
    pub internal_count: usize,
    pub external_count: usize,
    pub implied_count: usize,
}

impl LinkStats {
    pub fn from_diagram(schema: &Schema, diagram: &Diagram) -> Self {
        let count = |kind: LinkKind| {
            diagram
                .explicit
                .iter()
                .chain(&diagram.implicit)
                .filter(|r| r.kind == kind)
                .count()
        };

        Self {
            table_count: schema.len(),
            field_count: schema.iter().map(|t| t.fields.len()).sum(),
            internal_count: count(LinkKind::Internal),
            external_count: count(LinkKind::External),
            implied_count: count(LinkKind::Implied),
        }
    }
}

/// Build the JSON structure
pub fn build_links_json(schema: &Schema, diagram: &Diagram, prefix: &str) -> LinksJson {
    LinksJson {
        component: schema.component.clone(),
        prefix: prefix.to_string(),
        relationships: diagram
            .explicit
            .iter()
            .chain(&diagram.implicit)
            .cloned()
            .collect(),
        external_tables: diagram.external_tables.clone(),
        stats: LinkStats::from_diagram(schema, diagram),
    }
}

/// Generate pretty-printed JSON output
pub fn to_json(schema: &Schema, diagram: &Diagram, prefix: &str) -> String {
    let links = build_links_json(schema, diagram, prefix);
    serde_json::to_string_pretty(&links).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erd::{analyze, InferenceOptions};
    use crate::schema::{FieldType, Key, Table};

    #[test]
    fn test_links_json() {
        let schema = Schema::from_tables(vec![
            Table::new("book").field("id", FieldType::Integer),
            Table::new("page")
                .field("id", FieldType::Integer)
                .field("bookid", FieldType::Integer)
                .field("courseid", FieldType::Integer)
                .key(Key::foreign("courseid", ["courseid"], "course", ["id"])),
        ]);
        let diagram = analyze(&schema, "", &InferenceOptions::default());
        let json: serde_json::Value = serde_json::from_str(&to_json(&schema, &diagram, "")).unwrap();

        assert_eq!(json["stats"]["table_count"], 2);
        assert_eq!(json["stats"]["external_count"], 1);
        assert_eq!(json["stats"]["implied_count"], 1);
        assert_eq!(json["relationships"][1]["kind"], "implied");
        assert_eq!(json["relationships"][1]["to_table"], "book");
        assert_eq!(json["external_tables"][0], "course");
    }
}
