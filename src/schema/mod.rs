//! Schema model for ER diagram generation.
//!
//! This module provides:
//! - Data models for a component's tables, fields and keys
//! - Schema loading from XMLDB `install.xml`, JSON/YAML documents and SQL DDL
//! - Structural validation of the loaded model

mod ddl;
mod loader;
mod xmldb;

pub use ddl::*;
pub use loader::*;
pub use xmldb::parse_xmldb;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum FieldType {
    Integer,
    Number,
    Float,
    Char,
    Binary,
    Datetime,
    /// Free text; also the fallback for unrecognised type names
    #[default]
    Text,
}

impl FieldType {
    /// Map a type name from a schema document. Unknown names become `Text`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "integer" | "int" => FieldType::Integer,
            "number" | "numeric" | "decimal" => FieldType::Number,
            "float" | "double" => FieldType::Float,
            "char" | "varchar" | "character" => FieldType::Char,
            "binary" | "blob" => FieldType::Binary,
            "datetime" | "timestamp" | "date" => FieldType::Datetime,
            _ => FieldType::Text,
        }
    }

    /// Map a SQL column type (MySQL, PostgreSQL, SQLite, MSSQL spellings)
    pub fn from_sql_type(type_str: &str) -> Self {
        let type_lower = type_str.to_lowercase();
        let base_type = type_lower.split('(').next().unwrap_or(&type_lower).trim();

        match base_type {
            "int" | "integer" | "tinyint" | "smallint" | "mediumint" | "bigint" | "int2"
            | "int4" | "int8" | "serial" | "smallserial" | "bigserial" => FieldType::Integer,
            "decimal" | "numeric" | "money" => FieldType::Number,
            "float" | "double" | "real" | "float4" | "float8" => FieldType::Float,
            "char" | "varchar" | "nchar" | "nvarchar" | "character" | "enum" | "set" => {
                FieldType::Char
            }
            "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob"
            | "bytea" => FieldType::Binary,
            "date" | "datetime" | "datetime2" | "timestamp" | "timestamptz" | "time"
            | "timetz" | "year" => FieldType::Datetime,
            _ => FieldType::Text,
        }
    }

    /// Short label shown next to the field name in diagrams
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::Integer => "int",
            FieldType::Number => "number",
            FieldType::Float => "float",
            FieldType::Char => "varchar",
            FieldType::Binary => "blob",
            FieldType::Datetime => "datetime",
            FieldType::Text => "text",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Float => "float",
            FieldType::Char => "char",
            FieldType::Binary => "binary",
            FieldType::Datetime => "datetime",
            FieldType::Text => "text",
        }
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        FieldType::from_name(&s)
    }
}

impl From<FieldType> for &'static str {
    fn from(t: FieldType) -> Self {
        t.as_str()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key kind. Everything that is not the primary key is a link candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum KeyKind {
    Primary,
    #[default]
    Other,
}

impl From<String> for KeyKind {
    fn from(s: String) -> Self {
        if s.trim().eq_ignore_ascii_case("primary") {
            KeyKind::Primary
        } else {
            KeyKind::Other
        }
    }
}

impl From<KeyKind> for &'static str {
    fn from(k: KeyKind) -> Self {
        match k {
            KeyKind::Primary => "primary",
            KeyKind::Other => "foreign",
        }
    }
}

/// Field definition within a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Key definition: primary key, or a link from local fields to another table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub name: String,
    #[serde(default)]
    pub kind: KeyKind,
    /// Local field names, in key order
    #[serde(default)]
    pub fields: Vec<String>,
    /// Referenced table (non-primary keys only)
    #[serde(default, alias = "reftable", skip_serializing_if = "Option::is_none")]
    pub ref_table: Option<String>,
    /// Referenced field names, in key order
    #[serde(default, alias = "reffields", skip_serializing_if = "Vec::is_empty")]
    pub ref_fields: Vec<String>,
}

impl Key {
    /// Create a primary key over the given fields
    pub fn primary<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "primary".to_string(),
            kind: KeyKind::Primary,
            fields: fields.into_iter().map(Into::into).collect(),
            ref_table: None,
            ref_fields: Vec::new(),
        }
    }

    /// Create a non-primary key linking `fields` to `ref_fields` of `ref_table`
    pub fn foreign<I, S, J, T>(
        name: impl Into<String>,
        fields: I,
        ref_table: impl Into<String>,
        ref_fields: J,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            kind: KeyKind::Other,
            fields: fields.into_iter().map(Into::into).collect(),
            ref_table: Some(ref_table.into()),
            ref_fields: ref_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.kind == KeyKind::Primary
    }
}

/// Complete table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub keys: Vec<Key>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Append a field (builder style)
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(Field::new(name, field_type));
        self
    }

    /// Append a key (builder style)
    pub fn key(mut self, key: Key) -> Self {
        self.keys.push(key);
        self
    }

    /// Get a field by name
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Keys other than the primary key
    pub fn non_primary_keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter().filter(|k| !k.is_primary())
    }
}

/// All tables of one component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Component path the tables belong to (e.g. `mod/forum`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Tables in declaration order
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema from tables
    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self {
            component: None,
            tables,
        }
    }

    /// Get table by name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Get mutable table by name
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if schema is empty
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterate over all tables
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Reject duplicate table or field names and keys over unknown local fields
    pub fn validate(&self) -> Result<(), SchemaLoadError> {
        let mut table_names = AHashSet::new();
        for table in &self.tables {
            if !table_names.insert(table.name.as_str()) {
                return Err(SchemaLoadError::DuplicateTable(table.name.clone()));
            }

            let mut field_names = AHashSet::new();
            for field in &table.fields {
                if !field_names.insert(field.name.as_str()) {
                    return Err(SchemaLoadError::DuplicateField {
                        table: table.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }

            for key in &table.keys {
                if let Some(missing) = key.fields.iter().find(|f| !field_names.contains(f.as_str()))
                {
                    return Err(SchemaLoadError::UnknownKeyField {
                        table: table.name.clone(),
                        key: key.name.clone(),
                        field: missing.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
