//! Graph command implementation for ERD generation.

use super::{prepare, SchemaArgs};
use crate::erd::{analyze, to_dot, RenderOptions};
use anyhow::{bail, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run the graph command
pub fn run(args: SchemaArgs, output: Option<PathBuf>, fields: bool, render: bool) -> Result<()> {
    let prepared = prepare(&args)?;
    let schema = &prepared.schema;

    eprintln!(
        "Generating ERD: {} [{} tables, prefix: {}]",
        args.file.display(),
        schema.len(),
        if prepared.prefix.is_empty() {
            "none"
        } else {
            prepared.prefix.as_str()
        }
    );

    let options = RenderOptions {
        include_field_detail: fields || prepared.config.fields,
    };
    let diagram = analyze(schema, &prepared.prefix, &prepared.inference);
    let output_content = to_dot(
        &schema.tables,
        &diagram.explicit,
        &diagram.implicit,
        &diagram.external_tables,
        options,
    );

    // Handle rendering to PNG/SVG/PDF if requested
    let should_render = render
        || output
            .as_ref()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_lowercase().as_str(), "png" | "svg" | "pdf"))
            .unwrap_or(false);

    if should_render {
        if let Some(ref out_path) = output {
            render_with_graphviz(&output_content, out_path)?;
            print_summary(schema.len(), &diagram);
            return Ok(());
        }
    }

    if let Some(ref out_path) = output {
        let mut file = File::create(out_path)?;
        file.write_all(output_content.as_bytes())?;
        eprintln!("ERD written to: {}", out_path.display());
    } else {
        print!("{}", output_content);
    }

    print_summary(schema.len(), &diagram);
    Ok(())
}

fn print_summary(tables: usize, diagram: &crate::erd::Diagram) {
    eprintln!(
        "\nERD: {} tables, {} declared links, {} implied links, {} external tables",
        tables,
        diagram.explicit.len(),
        diagram.implicit.len(),
        diagram.external_tables.len()
    );
}

/// Render DOT to PNG/SVG/PDF using Graphviz
fn render_with_graphviz(dot_source: &str, output_path: &Path) -> Result<()> {
    let ext = output_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");

    let format_arg = format!("-T{}", ext);

    let mut child = Command::new("dot")
        .arg(&format_arg)
        .arg("-o")
        .arg(output_path)
        .stdin(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!(
                    "Graphviz 'dot' command not found. Install Graphviz or write a .dot file instead."
                )
            } else {
                anyhow::anyhow!("Failed to run dot: {}", e)
            }
        })?;

    if let Some(ref mut stdin) = child.stdin {
        stdin.write_all(dot_source.as_bytes())?;
    }
    // Close stdin so dot sees EOF
    drop(child.stdin.take());

    let status = child.wait()?;
    if !status.success() {
        bail!("Graphviz dot command failed with status: {}", status);
    }

    eprintln!("Rendered to: {}", output_path.display());
    Ok(())
}
