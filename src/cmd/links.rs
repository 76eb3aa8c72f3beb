//! Links command: list declared and implied relationships.

use super::{prepare, SchemaArgs};
use crate::erd::{analyze, json::LinkStats, to_json, LinkKind};
use anyhow::Result;

/// Run the links command
pub fn run(args: SchemaArgs, json: bool) -> Result<()> {
    let prepared = prepare(&args)?;
    let schema = &prepared.schema;
    let diagram = analyze(schema, &prepared.prefix, &prepared.inference);

    if json {
        println!("{}", to_json(schema, &diagram, &prepared.prefix));
        return Ok(());
    }

    for rel in diagram.explicit.iter().chain(&diagram.implicit) {
        let marker = match rel.kind {
            LinkKind::Internal => "declared",
            LinkKind::External => "external",
            LinkKind::Implied => "implied",
        };
        println!(
            "{:<9} {}.{} -> {}.{}",
            marker, rel.from_table, rel.from_field, rel.to_table, rel.to_field
        );
    }

    let stats = LinkStats::from_diagram(schema, &diagram);
    eprintln!(
        "\nLinks: {} declared, {} external, {} implied across {} tables ({} fields)",
        stats.internal_count,
        stats.external_count,
        stats.implied_count,
        stats.table_count,
        stats.field_count
    );
    if !diagram.external_tables.is_empty() {
        eprintln!("External tables: {}", diagram.external_tables.join(", "));
    }

    Ok(())
}
