//! Schema file loading.
//!
//! Reads a schema definition file, builds the in-memory model and checks its
//! structure before any diagram work starts.

use super::{parse_sql_schema, parse_xmldb, Schema};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading a schema definition
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("schema file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON schema document {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML schema document {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("invalid XMLDB file {}: {source}", .path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("cannot detect schema format of {}; use --format xmldb|json|yaml|sql", .0.display())]
    UnknownFormat(PathBuf),

    #[error("no tables found in {}", .0.display())]
    NoTables(PathBuf),

    #[error("duplicate table '{0}'")]
    DuplicateTable(String),

    #[error("duplicate field '{field}' in table '{table}'")]
    DuplicateField { table: String, field: String },

    #[error("key '{key}' on table '{table}' references unknown field '{field}'")]
    UnknownKeyField {
        table: String,
        key: String,
        field: String,
    },
}

/// Input format of a schema definition file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Moodle XMLDB `install.xml`
    Xmldb,
    /// JSON document of tables, fields and keys
    Json,
    /// YAML document with the same shape as JSON
    Yaml,
    /// SQL DDL script (CREATE TABLE / ALTER TABLE)
    Sql,
}

impl FromStr for SchemaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xmldb" | "xml" => Ok(SchemaFormat::Xmldb),
            "json" => Ok(SchemaFormat::Json),
            "yaml" | "yml" => Ok(SchemaFormat::Yaml),
            "sql" | "ddl" => Ok(SchemaFormat::Sql),
            _ => Err(format!(
                "Unknown schema format: {}. Valid options: xmldb, json, yaml, sql",
                s
            )),
        }
    }
}

impl fmt::Display for SchemaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaFormat::Xmldb => write!(f, "xmldb"),
            SchemaFormat::Json => write!(f, "json"),
            SchemaFormat::Yaml => write!(f, "yaml"),
            SchemaFormat::Sql => write!(f, "sql"),
        }
    }
}

impl SchemaFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xml" => Some(SchemaFormat::Xmldb),
            "json" => Some(SchemaFormat::Json),
            "yaml" | "yml" => Some(SchemaFormat::Yaml),
            "sql" | "ddl" => Some(SchemaFormat::Sql),
            _ => None,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Load and validate a schema file. Without an explicit format the file
/// extension decides.
pub fn load_schema(path: &Path, format: Option<SchemaFormat>) -> Result<Schema, SchemaLoadError> {
    if !path.exists() {
        return Err(SchemaLoadError::NotFound(path.to_path_buf()));
    }

    let format = format
        .or_else(|| SchemaFormat::from_path(path))
        .ok_or_else(|| SchemaLoadError::UnknownFormat(path.to_path_buf()))?;

    let content = fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), %format, "loading schema");
    let schema = parse_schema(&content, format, path)?;

    if schema.is_empty() {
        return Err(SchemaLoadError::NoTables(path.to_path_buf()));
    }
    schema.validate()?;

    info!(tables = schema.len(), "schema loaded");
    Ok(schema)
}

/// Parse schema text in the given format. `origin` is only used for error messages.
pub fn parse_schema(
    content: &str,
    format: SchemaFormat,
    origin: &Path,
) -> Result<Schema, SchemaLoadError> {
    match format {
        SchemaFormat::Xmldb => {
            parse_xmldb(content, origin).map_err(|source| SchemaLoadError::Xml {
                path: origin.to_path_buf(),
                source,
            })
        }
        SchemaFormat::Json => {
            serde_json::from_str(content).map_err(|source| SchemaLoadError::Json {
                path: origin.to_path_buf(),
                source,
            })
        }
        SchemaFormat::Yaml => {
            serde_yaml_ng::from_str(content).map_err(|source| SchemaLoadError::Yaml {
                path: origin.to_path_buf(),
                source,
            })
        }
        SchemaFormat::Sql => Ok(parse_sql_schema(content)),
    }
}
