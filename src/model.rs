//! Canonical, renderer-agnostic schema graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cardinality::Cardinality;
use crate::error::Error;

/// Source text format a schema was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Sql,
    Mermaid,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Mermaid => "mermaid",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sql" => Ok(Self::Sql),
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// Declared nullability of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Nullability {
    NotNull,
    Nullable,
    /// Nothing was declared either way.
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnReference {
    pub table: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub nullability: Nullability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ColumnReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            is_primary_key: false,
            is_unique: false,
            is_foreign_key: false,
            nullability: Nullability::Unknown,
            references: None,
            source_table: None,
            source_column: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullability = Nullability::NotNull;
        self
    }

    /// Point this column at `table.column`, keeping `is_foreign_key` in sync.
    pub fn set_reference(&mut self, table: impl Into<String>, column: impl Into<String>) {
        self.references = Some(ColumnReference {
            table: table.into(),
            column: column.into(),
            cardinality: None,
        });
        self.is_foreign_key = true;
    }

    pub fn clear_reference(&mut self) {
        self.references = None;
        self.is_foreign_key = false;
    }

    /// Synthesized `_ref_<table>` columns on views.
    pub fn is_virtual(&self) -> bool {
        self.name.starts_with("_ref_")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_view: bool,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            position: [0.0; 3],
            color: String::new(),
            category: String::new(),
            is_view: false,
        }
    }

    pub fn view(name: impl Into<String>) -> Self {
        Self {
            is_view: true,
            ..Self::new(name)
        }
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    /// Insert or replace by name; a replaced column keeps its slot.
    pub fn upsert_column(&mut self, column: Column) {
        match self.column_mut(&column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = (&Column, &ColumnReference)> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_ref().map(|r| (c, r)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSchema {
    pub name: String,
    pub format: Format,
    pub tables: Vec<Table>,
}

impl DatabaseSchema {
    pub fn new(name: impl Into<String>, format: Format) -> Self {
        Self {
            name: name.into(),
            format,
            tables: Vec::new(),
        }
    }

    /// Case-insensitive table lookup.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn table_index(&self, name: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn relationship_count(&self) -> usize {
        self.tables.iter().map(|t| t.foreign_keys().count()).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut table = Table::new("users");
        table.upsert_column(Column::new("id", "INT").primary_key());
        table.upsert_column(Column::new("email", "TEXT"));
        table.upsert_column(Column::new("EMAIL", "VARCHAR(255)"));

        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[1].name, "EMAIL");
        assert_eq!(table.columns[1].typ, "VARCHAR(255)");
    }

    #[test]
    fn test_reference_keeps_flag_in_sync() {
        let mut col = Column::new("user_id", "INT");
        col.set_reference("users", "id");
        assert!(col.is_foreign_key);
        col.clear_reference();
        assert!(!col.is_foreign_key);
        assert!(col.references.is_none());
    }

    #[test]
    fn test_json_field_names() {
        let mut schema = DatabaseSchema::new("s", Format::Sql);
        let mut table = Table::new("users");
        table.upsert_column(Column::new("id", "INT").primary_key());
        schema.tables.push(table);

        let json = schema.to_json().unwrap();
        assert!(json.contains("\"isPrimaryKey\":true"));
        assert!(json.contains("\"format\":\"sql\""));
        assert!(json.contains("\"isView\":false"));

        let back = DatabaseSchema::from_json(&json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("SQL".parse::<Format>().unwrap(), Format::Sql);
        assert_eq!("mermaid".parse::<Format>().unwrap(), Format::Mermaid);
        assert!("dbml".parse::<Format>().is_err());
    }
}
