//! SQL DDL parsing for schema extraction.
//!
//! Parses CREATE TABLE and ALTER TABLE statements to extract:
//! - Field definitions with semantic types
//! - Primary key constraints (table level or inline)
//! - Foreign key constraints (table level, inline REFERENCES, or ALTER TABLE)

use super::{Field, FieldType, Key, Schema, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Regex to extract table name from CREATE TABLE
/// Supports: `table` (MySQL), "table" (PostgreSQL), [table] (MSSQL), table (SQLite/unquoted), schema.table
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*CREATE\s+(?:TEMPORARY\s+|TEMP\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?"#)
        .unwrap()
});

/// Regex to extract table name from ALTER TABLE
static ALTER_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*ALTER\s+TABLE\s+(?:ONLY\s+)?(?:IF\s+EXISTS\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s]+)[\]`"]?"#).unwrap()
});

/// Regex for column definition: name followed by a type
static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*[\[`"]?([^\[\]`"\s,]+)[\]`"]?\s+(\w+(?:\([^)]+\))?)"#).unwrap()
});

/// Regex for PRIMARY KEY constraint
/// Supports MSSQL CLUSTERED/NONCLUSTERED keywords: PRIMARY KEY CLUSTERED ([col])
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)PRIMARY\s+KEY\s*(?:CLUSTERED\s+|NONCLUSTERED\s+)?\(([^)]+)\)").unwrap()
});

/// Regex for inline PRIMARY KEY on column
static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

/// Regex for FOREIGN KEY constraint with optional constraint name
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:CONSTRAINT\s+[\[`"]?([^\[\]`"\s]+)[\]`"]?\s+)?FOREIGN\s+KEY\s*(?:[\[`"]?\w+[\]`"]?\s*)?\(([^)]+)\)\s*REFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*\(([^)]+)\)"#,
    )
    .unwrap()
});

/// Regex for an inline column reference: `col INT REFERENCES other(id)`
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bREFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*\(([^)]+)\)"#,
    )
    .unwrap()
});

/// Builder for constructing a schema from DDL statements
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            schema: Schema::new(),
        }
    }

    /// Dispatch one statement to the matching parser. Other statements are ignored.
    pub fn parse_statement(&mut self, stmt: &str) {
        if CREATE_TABLE_NAME_RE.is_match(stmt) {
            self.parse_create_table(stmt);
        } else if ALTER_TABLE_NAME_RE.is_match(stmt) {
            self.parse_alter_table(stmt);
        }
    }

    /// Parse a CREATE TABLE statement and add it to the schema.
    /// Returns the table name when a table was added.
    pub fn parse_create_table(&mut self, stmt: &str) -> Option<String> {
        let table_name = extract_create_table_name(stmt)?;

        if self.schema.get_table(&table_name).is_some() {
            debug!(table = %table_name, "duplicate CREATE TABLE ignored");
            return None;
        }

        let body = extract_table_body(stmt)?;
        let mut table = Table::new(table_name.clone());
        parse_table_body(&body, &mut table);

        self.schema.tables.push(table);
        Some(table_name)
    }

    /// Parse an ALTER TABLE statement and add any foreign keys it declares
    pub fn parse_alter_table(&mut self, stmt: &str) -> Option<String> {
        let table_name = extract_alter_table_name(stmt)?;
        let table = self.schema.get_table_mut(&table_name)?;

        for key in parse_foreign_keys(stmt) {
            push_resolved_key(table, key);
        }

        Some(table_name)
    }

    /// Finalize the schema, mapping referenced table names onto the
    /// declared spelling of a matching table
    pub fn build(mut self) -> Schema {
        self.resolve_ref_tables();
        self.schema
    }

    /// SQL identifiers are case-insensitive, so `REFERENCES Users` points at
    /// a declared `users` table
    fn resolve_ref_tables(&mut self) {
        let declared: Vec<String> = self.schema.tables.iter().map(|t| t.name.clone()).collect();

        for table in &mut self.schema.tables {
            for key in &mut table.keys {
                let Some(ref_table) = key.ref_table.as_mut() else {
                    continue;
                };
                if declared.iter().any(|name| name.as_str() == ref_table.as_str()) {
                    continue;
                }
                let matching = declared
                    .iter()
                    .find(|name| name.eq_ignore_ascii_case(ref_table.as_str()));
                if let Some(name) = matching {
                    debug!(
                        table = %table.name,
                        reference = %ref_table,
                        resolved = %name,
                        "reference matched case-insensitively"
                    );
                    *ref_table = name.clone();
                }
            }
        }
    }

    /// Get current schema (for inspection during building)
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Build a schema from a complete SQL script
pub fn parse_sql_schema(sql: &str) -> Schema {
    let mut builder = SchemaBuilder::new();
    for stmt in split_statements(sql) {
        builder.parse_statement(&stmt);
    }
    builder.build()
}

/// Extract table name from CREATE TABLE statement
pub fn extract_create_table_name(stmt: &str) -> Option<String> {
    CREATE_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract table name from ALTER TABLE statement
pub fn extract_alter_table_name(stmt: &str) -> Option<String> {
    ALTER_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Split a SQL script into statements on `;`, skipping comments and
/// ignoring separators inside quotes.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == '\\' && q == '\'' {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' | '`' => {
                quote = Some(ch);
                current.push(ch);
            }
            '-' if chars.peek() == Some(&'-') => {
                // Line comment
                for c in chars.by_ref() {
                    if c == '\n' {
                        current.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                current.push(' ');
            }
            ';' => {
                if !current.trim().is_empty() {
                    statements.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    statements
}

/// Extract the body of a CREATE TABLE statement (between first ( and matching ))
fn extract_table_body(stmt: &str) -> Option<String> {
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;

    for (i, ch) in stmt.char_indices() {
        if ch == '\'' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        if ch == '(' {
            if depth == 0 {
                start = Some(i + 1);
            }
            depth += 1;
        } else if ch == ')' {
            depth -= 1;
            if depth == 0 {
                if let Some(s) = start {
                    return Some(stmt[s..i].to_string());
                }
            }
        }
    }

    None
}

/// Parse the body of a CREATE TABLE to extract fields and keys
fn parse_table_body(body: &str, table: &mut Table) {
    let mut primary_key: Vec<String> = Vec::new();
    let mut foreign_keys: Vec<Key> = Vec::new();

    for part in split_table_body(body) {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }

        let upper = trimmed.to_uppercase();
        if upper.starts_with("PRIMARY KEY")
            || upper.starts_with("CONSTRAINT")
            || upper.starts_with("FOREIGN KEY")
            || upper.starts_with("KEY ")
            || upper.starts_with("INDEX ")
            || upper.starts_with("UNIQUE ")
            || upper.starts_with("FULLTEXT ")
            || upper.starts_with("SPATIAL ")
            || upper.starts_with("CHECK ")
        {
            if let Some(cols) = parse_primary_key_constraint(trimmed) {
                for col in cols {
                    if !primary_key.contains(&col) {
                        primary_key.push(col);
                    }
                }
            }
            foreign_keys.extend(parse_foreign_keys(trimmed));
        } else if let Some(field) = parse_column_def(trimmed) {
            if INLINE_PRIMARY_KEY_RE.is_match(trimmed) {
                primary_key.push(field.name.clone());
            }
            if let Some(key) = parse_inline_reference(&field.name, trimmed) {
                foreign_keys.push(key);
            }
            table.fields.push(field);
        }
    }

    let pk_fields: Vec<String> = primary_key
        .iter()
        .filter_map(|name| resolve_field_name(table, name))
        .collect();
    if !pk_fields.is_empty() {
        table.keys.push(Key::primary(pk_fields));
    }

    for key in foreign_keys {
        push_resolved_key(table, key);
    }
}

/// Add a key to the table after mapping its local column names to the
/// table's field spelling. Keys naming unknown columns are dropped.
fn push_resolved_key(table: &mut Table, mut key: Key) {
    let resolved: Vec<String> = key
        .fields
        .iter()
        .filter_map(|name| resolve_field_name(table, name))
        .collect();

    if resolved.len() != key.fields.len() {
        debug!(table = %table.name, key = %key.name, "key names unknown columns, skipped");
        return;
    }

    key.fields = resolved;
    table.keys.push(key);
}

/// Case-insensitive field lookup returning the declared spelling
fn resolve_field_name(table: &Table, name: &str) -> Option<String> {
    table
        .fields
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
        .map(|f| f.name.clone())
}

/// Split table body by commas, respecting nested parentheses
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in body.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            current.push(ch);
            escape_next = true;
            continue;
        }

        if ch == '\'' {
            in_string = !in_string;
            current.push(ch);
            continue;
        }

        if in_string {
            current.push(ch);
            continue;
        }

        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Parse a column definition
fn parse_column_def(def: &str) -> Option<Field> {
    let caps = COLUMN_DEF_RE.captures(def)?;
    let name = caps.get(1)?.as_str().to_string();
    let type_str = caps.get(2)?.as_str();

    Some(Field::new(name, FieldType::from_sql_type(type_str)))
}

/// Parse PRIMARY KEY constraint, returns column names
fn parse_primary_key_constraint(constraint: &str) -> Option<Vec<String>> {
    let caps = PRIMARY_KEY_RE.captures(constraint)?;
    let cols_str = caps.get(1)?.as_str();
    Some(parse_column_list(cols_str))
}

/// Parse an inline `REFERENCES table(col)` clause on a column definition
fn parse_inline_reference(column: &str, def: &str) -> Option<Key> {
    let caps = INLINE_REFERENCES_RE.captures(def)?;
    let ref_table = caps.get(1)?.as_str();
    let ref_cols = parse_column_list(caps.get(2)?.as_str());

    Some(Key::foreign(column, [column], ref_table, ref_cols))
}

/// Parse FOREIGN KEY constraints from a statement
fn parse_foreign_keys(stmt: &str) -> Vec<Key> {
    let mut keys = Vec::new();

    for caps in FOREIGN_KEY_RE.captures_iter(stmt) {
        let local_cols = caps
            .get(2)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();
        let ref_table = caps
            .get(3)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let ref_cols = caps
            .get(4)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();

        if local_cols.is_empty() || ref_table.is_empty() {
            continue;
        }

        // Unnamed constraints are named after their first column
        let name = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| local_cols[0].clone());

        keys.push(Key::foreign(name, local_cols, ref_table, ref_cols));
    }

    keys
}

/// Parse a comma-separated column list, stripping quotes (backticks, double quotes, brackets)
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| {
            c.trim()
                .trim_matches('`')
                .trim_matches('"')
                .trim_matches('[')
                .trim_matches(']')
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}
