//! Schema Translator
//!
//! Maps a relational table's column metadata onto the remote index's field
//! types. The mapping is a fixed lookup on the base SQL type name, so the same
//! table always yields the same schema.
//!
//! ```text
//! tinyint smallint mediumint int integer bigint  → INT
//! float decimal numeric                          → FLOAT
//! double                                         → DOUBLE
//! char time timestamp year                       → LITERAL
//! anything else                                  → TEXT
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Field types supported by the remote index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "INT")]
    Integer,
    #[serde(rename = "FLOAT")]
    Float,
    #[serde(rename = "DOUBLE")]
    Double,
    /// Exact-match string, filterable but not tokenized
    #[serde(rename = "LITERAL")]
    Literal,
    /// Tokenized full-text field
    #[serde(rename = "TEXT")]
    Text,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Integer => write!(f, "INT"),
            FieldType::Float => write!(f, "FLOAT"),
            FieldType::Double => write!(f, "DOUBLE"),
            FieldType::Literal => write!(f, "LITERAL"),
            FieldType::Text => write!(f, "TEXT"),
        }
    }
}

/// Column name and declared SQL type, as reported by the relational store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub sql_type: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// Everything the provisioner needs to know about a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub table_name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnMeta>,
    pub primary_key: String,
}

impl TableMetadata {
    pub fn new(table_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key: primary_key.into(),
        }
    }

    /// Append a column (builder style)
    pub fn column(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.columns.push(ColumnMeta::new(name, sql_type));
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnMeta>) -> Self {
        self.columns = columns;
        self
    }
}

/// A column translated into the remote schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub is_primary_key: bool,
}

/// Infer the remote field type for a declared SQL type.
///
/// Only the base type name counts: `varchar(255)`, `INT(11) UNSIGNED` and
/// `double precision` resolve through `varchar`, `int` and `double`.
pub fn infer_field_type(sql_type: &str) -> FieldType {
    let lowered = sql_type.trim().to_ascii_lowercase();
    let base = lowered
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or("");

    match base {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => FieldType::Integer,
        "float" | "decimal" | "numeric" => FieldType::Float,
        "double" => FieldType::Double,
        "char" | "time" | "timestamp" | "year" => FieldType::Literal,
        _ => FieldType::Text,
    }
}

/// Translate every column of a table, preserving column order.
///
/// The primary key is matched case-insensitively; a table whose key column is
/// not among its columns cannot be provisioned.
pub fn translate_columns(meta: &TableMetadata) -> Result<Vec<FieldDescriptor>, SyncError> {
    let fields: Vec<FieldDescriptor> = meta
        .columns
        .iter()
        .map(|col| FieldDescriptor {
            name: col.name.clone(),
            field_type: infer_field_type(&col.sql_type),
            is_primary_key: col.name.eq_ignore_ascii_case(&meta.primary_key),
        })
        .collect();

    match fields.iter().filter(|f| f.is_primary_key).count() {
        1 => Ok(fields),
        0 => Err(SyncError::Config(format!(
            "primary key '{}' not found in table '{}'",
            meta.primary_key, meta.table_name
        ))),
        _ => Err(SyncError::Config(format!(
            "primary key '{}' matches several columns of table '{}'",
            meta.primary_key, meta.table_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_family() {
        for t in ["tinyint", "smallint", "mediumint", "int", "integer", "bigint"] {
            assert_eq!(infer_field_type(t), FieldType::Integer, "{}", t);
        }
    }

    #[test]
    fn test_float_family() {
        for t in ["float", "decimal", "numeric"] {
            assert_eq!(infer_field_type(t), FieldType::Float, "{}", t);
        }
        assert_eq!(infer_field_type("double"), FieldType::Double);
    }

    #[test]
    fn test_literal_family() {
        for t in ["char", "time", "timestamp", "year"] {
            assert_eq!(infer_field_type(t), FieldType::Literal, "{}", t);
        }
    }

    #[test]
    fn test_unknown_types_fall_back_to_text() {
        for t in ["varchar", "text", "longtext", "json", "blob", "date", "datetime", "", "geometry"] {
            assert_eq!(infer_field_type(t), FieldType::Text, "{}", t);
        }
    }

    #[test]
    fn test_declared_type_decorations_are_ignored() {
        assert_eq!(infer_field_type("INT(11) UNSIGNED"), FieldType::Integer);
        assert_eq!(infer_field_type("decimal(10,2)"), FieldType::Float);
        assert_eq!(infer_field_type("double precision"), FieldType::Double);
        assert_eq!(infer_field_type("  CHAR(32)"), FieldType::Literal);
        assert_eq!(infer_field_type("varchar(255)"), FieldType::Text);
    }

    #[test]
    fn test_display_uses_wire_names() {
        assert_eq!(FieldType::Integer.to_string(), "INT");
        assert_eq!(FieldType::Literal.to_string(), "LITERAL");
        assert_eq!(serde_json::to_value(FieldType::Double).unwrap(), "DOUBLE");
    }

    #[test]
    fn test_translate_columns_marks_primary_key() {
        let meta = TableMetadata::new("goods", "Goods_Id")
            .column("goods_id", "int(11)")
            .column("title", "varchar(255)")
            .column("price", "decimal(10,2)");

        let fields = translate_columns(&meta).unwrap();
        assert_eq!(fields.len(), 3);
        assert!(fields[0].is_primary_key);
        assert_eq!(fields[0].field_type, FieldType::Integer);
        assert!(!fields[1].is_primary_key);
        assert_eq!(fields[1].field_type, FieldType::Text);
        assert_eq!(fields[2].field_type, FieldType::Float);
    }

    #[test]
    fn test_translate_columns_missing_key() {
        let meta = TableMetadata::new("goods", "id").column("title", "varchar(255)");
        assert!(matches!(translate_columns(&meta), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_translate_is_deterministic() {
        let meta = TableMetadata::new("t", "id")
            .column("id", "bigint")
            .column("a", "timestamp")
            .column("b", "text");
        assert_eq!(translate_columns(&meta).unwrap(), translate_columns(&meta).unwrap());
    }
}
