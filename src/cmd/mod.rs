mod graph;
mod links;

use crate::component::{component_prefix, FixedPrefix, PluginPathResolver, PrefixResolver};
use crate::config::ErdConfig;
use crate::erd::{InferenceOptions, MatchPolicy};
use crate::schema::{load_schema, Schema, SchemaFormat};
use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "schema-erd")]
#[command(version)]
#[command(about = "Generate Graphviz ER diagrams from a component's table schema", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Schema input and link inference options shared by all diagram commands
#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Schema file: XMLDB install.xml, JSON or YAML table document, or SQL DDL
    pub file: PathBuf,

    /// Schema format: xmldb, json, yaml, sql (detected from the extension if not specified)
    #[arg(long)]
    pub format: Option<String>,

    /// YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Component path used to derive the table prefix (e.g. mod/forum)
    #[arg(long)]
    pub component: Option<String>,

    /// Table prefix for implied links (e.g. forum_), overrides --component
    #[arg(long)]
    pub prefix: Option<String>,

    /// Which table wins when several names match: first, last
    #[arg(long)]
    pub policy: Option<String>,

    /// Only infer links for integer fields
    #[arg(long)]
    pub integer_only: bool,

    /// Disable implied link inference
    #[arg(long)]
    pub no_infer: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a DOT diagram of the component's tables and links
    Graph {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Output file (default: stdout). A .png, .svg or .pdf extension renders with Graphviz
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show field rows and link individual fields
        #[arg(long)]
        fields: bool,

        /// Render through Graphviz `dot` (format taken from the output extension)
        #[arg(long, requires = "output")]
        render: bool,
    },

    /// List declared and implied links
    Links {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Graph {
            schema,
            output,
            fields,
            render,
        } => graph::run(schema, output, fields, render),
        Commands::Links { schema, json } => links::run(schema, json),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "schema-erd", &mut io::stdout());
            Ok(())
        }
    }
}

/// Loaded schema with every setting resolved from flags, config and schema
pub(crate) struct Prepared {
    pub schema: Schema,
    pub prefix: String,
    pub inference: InferenceOptions,
    pub config: ErdConfig,
}

/// Load config and schema, then resolve prefix and inference settings
pub(crate) fn prepare(args: &SchemaArgs) -> Result<Prepared> {
    let config = match &args.config {
        Some(path) => ErdConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ErdConfig::default(),
    };

    let format: Option<SchemaFormat> = args
        .format
        .as_deref()
        .map(str::parse::<SchemaFormat>)
        .transpose()
        .map_err(|e: String| anyhow!(e))?;

    let schema = load_schema(&args.file, format)?;

    let resolver: Box<dyn PrefixResolver> = match args.prefix.as_ref().or(config.prefix.as_ref()) {
        Some(prefix) => Box::new(FixedPrefix(prefix.clone())),
        None => Box::new(PluginPathResolver),
    };
    let component = args
        .component
        .as_deref()
        .or(config.component.as_deref())
        .or(schema.component.as_deref());
    let prefix = component_prefix(resolver.as_ref(), component);

    let mut inference = config.inference_options();
    if let Some(policy) = &args.policy {
        inference.policy = policy
            .parse::<MatchPolicy>()
            .map_err(|e| anyhow!("{}", e))?;
    }
    if args.integer_only {
        inference.integer_only = true;
    }
    if args.no_infer {
        inference.enabled = false;
    }

    info!(
        component = component.unwrap_or(""),
        prefix = %prefix,
        policy = %inference.policy,
        "settings resolved"
    );

    Ok(Prepared {
        schema,
        prefix,
        inference,
        config,
    })
}
