//! Records flowing from the relational source to the search index.
//!
//! An [`IndexableRecord`] is a snapshot of one relational row, reduced to a
//! field → scalar mapping. A [`DocumentOperation`] is the transient wire form
//! pushed to the remote index (`{"cmd": "ADD", "fields": {...}}`).

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Primary key of a relational row.
///
/// Totally ordered so it can drive a keyset cursor: integers sort before
/// text keys, integers numerically, text lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimaryKey {
    Int(i64),
    Text(String),
}

impl PrimaryKey {
    /// Read a key out of a JSON value, keeping the value's own type.
    ///
    /// Strings stay text even when they look numeric: a `VARCHAR` key of
    /// `"007"` must not become `7`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => Some(Self::Text(n.to_string())),
            },
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Textual form, as the search service reports every field
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Int(i) => Cow::Owned(i.to_string()),
            Self::Text(s) => Cow::Borrowed(s),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl Ord for PrimaryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Int(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Int(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for PrimaryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for PrimaryKey {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for PrimaryKey {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// A relational row reduced to field name → scalar value.
///
/// # Example
///
/// ```
/// use opensearch_sync::{IndexableRecord, PrimaryKey};
/// use serde_json::json;
///
/// let record = IndexableRecord::new()
///     .with("id", json!(7))
///     .with("title", json!("Green tea"))
///     .with("updated_at", json!("2024-01-01 00:00:00"));
///
/// assert_eq!(record.key("id"), Some(PrimaryKey::Int(7)));
/// let doc = record.sanitized(&["updated_at".to_string()]);
/// assert!(!doc.contains_key("updated_at"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexableRecord {
    fields: Map<String, Value>,
}

impl IndexableRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build from a JSON object. Returns `None` for any other JSON shape.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Set a field (builder style)
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Primary key value, looking the column up case-insensitively.
    pub fn key(&self, key_column: &str) -> Option<PrimaryKey> {
        self.fields
            .get(key_column)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(key_column))
                    .map(|(_, v)| v)
            })
            .and_then(PrimaryKey::from_value)
    }

    /// Copy of the fields with bookkeeping columns removed.
    pub fn sanitized(&self, excluded: &[String]) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(name, _)| !excluded.iter().any(|e| e == *name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Document command understood by the remote index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocCommand {
    /// Insert or replace (the remote upserts by primary key)
    Add,
    Delete,
}

impl DocCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Delete => "DELETE",
        }
    }
}

/// One entry of a document push batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOperation {
    pub cmd: DocCommand,
    pub fields: Map<String, Value>,
}

impl DocumentOperation {
    pub fn add(fields: Map<String, Value>) -> Self {
        Self { cmd: DocCommand::Add, fields }
    }

    pub fn delete(fields: Map<String, Value>) -> Self {
        Self { cmd: DocCommand::Delete, fields }
    }
}
