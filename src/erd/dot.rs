//! Graphviz DOT format output for ER diagrams.

use super::{LinkKind, Relationship, RenderOptions};
use crate::schema::{Field, Table};
use ahash::AHashMap;

const PREAMBLE: &str = r#"digraph component {

    fontname="Helvetica,Arial,sans-serif"
    nodesep=0.4
    node [
        shape=record,
        fontsize=9,
        fontname="Helvetica",
    ];
    edge [
        fontname="Helvetica,Arial,sans-serif",
        minlen=3
    ]
    graph [
        rankdir=LR,
        overlap=false,
        splines=true,
    ];

    comment="Now all of the component tables"
"#;

const IMPLIED_EDGE_ATTRS: &str =
    r##"label="implied", style="dashed", color="#666666", fontsize=9"##;

/// Generate DOT output for a component.
///
/// Each table's node is followed by its outgoing edges (declared first, then
/// implied). Component tables are grouped in one cluster; tables referenced
/// from outside the component get their own cluster when there are any.
pub fn to_dot(
    tables: &[Table],
    explicit: &[Relationship],
    implicit: &[Relationship],
    external_tables: &[String],
    options: RenderOptions,
) -> String {
    let mut output = String::from(PREAMBLE);

    let explicit_by_table = group_by_source(explicit);
    let implicit_by_table = group_by_source(implicit);

    for table in tables {
        output.push_str(&table_node(table, options));

        let outgoing = explicit_by_table
            .get(table.name.as_str())
            .into_iter()
            .chain(implicit_by_table.get(table.name.as_str()))
            .flatten();
        for rel in outgoing {
            output.push_str(&edge(rel, options));
        }
    }

    output.push_str("\n    subgraph cluster_component {\n");
    output.push_str("        label=\"Component tables\";\n");
    output.push_str("        style=filled;\n");
    output.push_str("        color=\"#eeeeee\";\n");
    for table in tables {
        output.push_str(&format!("        {};\n", quote_dot(&table.name)));
    }
    output.push_str("    }\n");

    if !external_tables.is_empty() {
        output.push_str("\n    comment=\"Now all of the external tables\"\n\n");

        for table in external_tables {
            output.push_str(&format!(
                "    {} [shape=box, style=filled, color=\"#333333\", fillcolor=orange, label={}];\n",
                escape_dot_id(table),
                quote_dot(table)
            ));
        }

        output.push_str("\n    subgraph cluster_external {\n");
        output.push_str("        label=\"External tables\";\n");
        output.push_str("        style=filled;\n");
        output.push_str("        color=\"#ffdd00\";\n");
        for table in external_tables {
            output.push_str(&format!("        {};\n", quote_dot(table)));
        }
        output.push_str("    }\n");
    }

    output.push_str("}\n");
    output
}

fn group_by_source(relationships: &[Relationship]) -> AHashMap<&str, Vec<&Relationship>> {
    let mut grouped: AHashMap<&str, Vec<&Relationship>> = AHashMap::new();
    for rel in relationships {
        grouped.entry(rel.from_table.as_str()).or_default().push(rel);
    }
    grouped
}

/// Node statement for a component table
fn table_node(table: &Table, options: RenderOptions) -> String {
    let id = escape_dot_id(&table.name);

    if !options.include_field_detail {
        return format!(
            "\n    {} [\n        shape=box,\n        style=filled,\n        color=\"#333333\",\n        fillcolor=lightblue,\n        label={}\n    ];\n\n",
            id,
            quote_dot(&table.name)
        );
    }

    let rows: String = table.fields.iter().map(field_row).collect();

    format!(
        r##"
    {id} [
        shape=none,
        margin=0,
        style=filled,
        color="#333333",
        fillcolor=white,
        label=<
        <table border="0" cellborder="1" cellspacing="0" cellpadding="2">
            <tr><td bgcolor="lightblue" colspan="2">{name}</td></tr>
{rows}        </table>>
    ];

"##,
        id = id,
        name = escape_html(&table.name),
        rows = rows
    )
}

/// One label row per field: type cell carries the inbound port, name cell the outbound one
fn field_row(field: &Field) -> String {
    let name = escape_html(&field.name);
    format!(
        "            <tr><td {:<30} align=\"left\">{:<10}<td {:<31} align=\"left\">{:<26}</tr>\n",
        format!("port=\"in{}\"", name),
        format!("{}</td>", field.field_type.label()),
        format!("port=\"out{}\"", name),
        format!("{}</td>", name)
    )
}

/// Edge statement for a relationship
fn edge(rel: &Relationship, options: RenderOptions) -> String {
    let from = escape_dot_id(&rel.from_table);
    let to = escape_dot_id(&rel.to_table);

    let mut attrs: Vec<&str> = Vec::new();
    if rel.is_self_reference() {
        attrs.push("minlen=1");
    }
    if rel.is_implicit() {
        attrs.push(IMPLIED_EDGE_ATTRS);
    }
    let attrs = if attrs.is_empty() {
        String::new()
    } else {
        format!(" [{}]", attrs.join(", "))
    };

    if !options.include_field_detail {
        return format!("    {} -> {}{};\n", from, to, attrs);
    }

    let out_port = escape_dot_id(&format!("out{}", rel.from_field));
    let in_port = escape_dot_id(&format!("in{}", rel.to_field));

    match rel.kind {
        // External nodes have no field ports
        LinkKind::External => format!("    {}:{} -> {}{};\n", from, out_port, to, attrs),
        _ if rel.is_self_reference() => {
            // Loop on the west side keeps self references compact
            let self_port = escape_dot_id(&format!("in{}", rel.from_field));
            format!(
                "    {}:{}:w -> {}:{}:w{};\n",
                from, self_port, to, in_port, attrs
            )
        }
        _ => format!("    {}:{} -> {}:{}{};\n", from, out_port, to, in_port, attrs),
    }
}

/// Escape a string for use in DOT HTML labels
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Quote a string as a DOT double-quoted ID
fn quote_dot(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Escape a string for use as a DOT node or port ID
fn escape_dot_id(s: &str) -> String {
    const KEYWORDS: [&str; 6] = ["node", "edge", "graph", "digraph", "subgraph", "strict"];

    let plain = !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && !KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(s));

    if plain {
        s.to_string()
    } else {
        quote_dot(s)
    }
}
