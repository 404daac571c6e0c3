// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Descriptor - what a caller asks the search service for
//!
//! A statically typed stand-in for a query-builder object: free-text term,
//! optional field scope, equality filters, sort specs, projection and
//! pagination.
//!
//! # Example
//!
//! ```rust
//! use opensearch_sync::search::{QueryDescriptor, SortDirection};
//!
//! let query = QueryDescriptor::new("green tea")
//!     .within("title")
//!     .filter("status", 1)
//!     .filter("category", 5)
//!     .order_by("price", SortDirection::Asc)
//!     .fields(["id", "title"])
//!     .page(20, 10);
//!
//! assert_eq!(query.filters.len(), 2);
//! assert_eq!(query.offset, 20);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hits requested when the caller does not paginate
pub const DEFAULT_LIMIT: i64 = 10;

/// Search request description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Free-text term
    pub term: String,
    /// Field-scoped search (`index:'term'`); `None` searches the default index
    #[serde(default)]
    pub index: Option<String>,
    /// Equality filters, in the order they were added
    #[serde(default)]
    pub filters: Vec<(String, FilterValue)>,
    /// Sort specs, in priority order
    #[serde(default)]
    pub orders: Vec<SortSpec>,
    /// Projection; `None` keeps the remote default
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    /// Hit offset. Passed through unvalidated.
    #[serde(default)]
    pub offset: i64,
    /// Hit count. Passed through unvalidated.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 { DEFAULT_LIMIT }

impl QueryDescriptor {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            index: None,
            filters: Vec::new(),
            orders: Vec::new(),
            fields: None,
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Scope the term to a single field
    pub fn within(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Add an equality filter. Filtering the same field twice keeps its
    /// original position and replaces the value.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.filters.iter_mut().find(|(f, _)| *f == field) {
            Some(existing) => existing.1 = value,
            None => self.filters.push((field, value)),
        }
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.orders.push(SortSpec {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn fields<I, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn page(mut self, offset: i64, limit: i64) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// Value of an equality filter, rendered verbatim into `field=value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Int(i) => write!(f, "{}", i),
            FilterValue::Float(x) => write!(f, "{}", x),
            FilterValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        FilterValue::Int(i)
    }
}

impl From<i32> for FilterValue {
    fn from(i: i32) -> Self {
        FilterValue::Int(i64::from(i))
    }
}

impl From<f64> for FilterValue {
    fn from(x: f64) -> Self {
        FilterValue::Float(x)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

/// Sort direction requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One `(column, direction)` sort spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = QueryDescriptor::new("tea");
        assert_eq!(query.term, "tea");
        assert!(query.index.is_none());
        assert!(query.filters.is_empty());
        assert!(query.orders.is_empty());
        assert!(query.fields.is_none());
        assert_eq!(query.offset, 0);
        assert_eq!(query.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_filters_keep_insertion_order() {
        let query = QueryDescriptor::new("")
            .filter("status", 1)
            .filter("category", 5)
            .filter("brand", "acme");

        let names: Vec<&str> = query.filters.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(names, vec!["status", "category", "brand"]);
    }

    #[test]
    fn test_refiltering_replaces_in_place() {
        let query = QueryDescriptor::new("")
            .filter("status", 1)
            .filter("category", 5)
            .filter("status", 2);

        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0], ("status".to_string(), FilterValue::Int(2)));
    }

    #[test]
    fn test_filter_value_display() {
        assert_eq!(FilterValue::Int(-3).to_string(), "-3");
        assert_eq!(FilterValue::Float(1.5).to_string(), "1.5");
        assert_eq!(FilterValue::Text("red".into()).to_string(), "red");
    }

    #[test]
    fn test_page_passes_negative_values_through() {
        let query = QueryDescriptor::new("x").page(-5, -1);
        assert_eq!(query.offset, -5);
        assert_eq!(query.limit, -1);
    }

    #[test]
    fn test_deserialize_descriptor() {
        let query: QueryDescriptor = serde_json::from_str(
            r#"{
                "term": "tea",
                "filters": [["status", 1], ["brand", "acme"]],
                "orders": [{"column": "price", "direction": "desc"}]
            }"#,
        )
        .unwrap();

        assert_eq!(query.filters[0].1, FilterValue::Int(1));
        assert_eq!(query.filters[1].1, FilterValue::Text("acme".into()));
        assert_eq!(query.orders[0].direction, SortDirection::Desc);
        assert_eq!(query.limit, DEFAULT_LIMIT);
    }
}
