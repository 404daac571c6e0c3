// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Translator
//!
//! Translates a [`QueryDescriptor`] into the vendor's search parameters.
//!
//! # Query clause
//!
//! ```text
//! config=start:0,hit:10,format:fulljson&&query=default:'tea'&&filter=status=1 AND category=5&&sort=-RANK
//! ```
//!
//! Terms are inserted between single quotes without escaping. A term that
//! contains `'` produces a clause the remote service may reject.

use super::query::{QueryDescriptor, SortDirection};
use crate::config::SortDirectionMode;

/// Relevance pseudo-field used when the caller supplies no ordering
pub const RANK_FIELD: &str = "RANK";

/// Index searched when the descriptor has no field scope
pub const DEFAULT_INDEX: &str = "default";

/// Result format requested from the service
pub const RESULT_FORMAT: &str = "fulljson";

/// A rendered sort entry (`+field` ascending, `-field` descending)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

impl SortClause {
    pub fn render(&self) -> String {
        let sign = match self.direction {
            SortDirection::Asc => '+',
            SortDirection::Desc => '-',
        };
        format!("{}{}", sign, self.field)
    }
}

/// Vendor search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub app_name: String,
    pub start: i64,
    pub hits: i64,
    /// `index:'term'`
    pub query: String,
    pub fetch_fields: Option<Vec<String>>,
    /// `f1=v1 AND f2=v2`, absent when there are no filters
    pub filter: Option<String>,
    /// Never empty: defaults to `-RANK`
    pub sort: Vec<SortClause>,
    pub format: String,
}

impl SearchParams {
    /// Render the `query` request parameter
    pub fn to_query_clause(&self) -> String {
        let mut clauses = vec![
            format!(
                "config=start:{},hit:{},format:{}",
                self.start, self.hits, self.format
            ),
            format!("query={}", self.query),
        ];

        if let Some(filter) = &self.filter {
            clauses.push(format!("filter={}", filter));
        }

        let sort: Vec<String> = self.sort.iter().map(SortClause::render).collect();
        clauses.push(format!("sort={}", sort.join(";")));

        clauses.join("&&")
    }

    /// Request parameters, in send order
    pub fn to_request_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("query".to_string(), self.to_query_clause())];
        if let Some(fields) = &self.fetch_fields {
            params.push(("fetch_fields".to_string(), fields.join(";")));
        }
        params
    }
}

/// Builds [`SearchParams`] for one application
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    app_name: String,
    mode: SortDirectionMode,
}

impl QueryTranslator {
    pub fn new(app_name: impl Into<String>, mode: SortDirectionMode) -> Self {
        Self {
            app_name: app_name.into(),
            mode,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn mode(&self) -> SortDirectionMode {
        self.mode
    }

    /// Translate a descriptor. Offset and limit pass through unvalidated.
    pub fn build(&self, descriptor: &QueryDescriptor) -> SearchParams {
        SearchParams {
            app_name: self.app_name.clone(),
            start: descriptor.offset,
            hits: descriptor.limit,
            query: Self::query_clause(descriptor),
            fetch_fields: descriptor.fields.clone(),
            filter: Self::filter_clause(descriptor),
            sort: self.sort_clauses(descriptor),
            format: RESULT_FORMAT.to_string(),
        }
    }

    fn query_clause(descriptor: &QueryDescriptor) -> String {
        let index = descriptor.index.as_deref().unwrap_or(DEFAULT_INDEX);
        format!("{}:'{}'", index, descriptor.term)
    }

    fn filter_clause(descriptor: &QueryDescriptor) -> Option<String> {
        if descriptor.filters.is_empty() {
            return None;
        }

        let parts: Vec<String> = descriptor
            .filters
            .iter()
            .map(|(field, value)| format!("{}={}", field, value))
            .collect();

        Some(parts.join(" AND "))
    }

    fn sort_clauses(&self, descriptor: &QueryDescriptor) -> Vec<SortClause> {
        if descriptor.orders.is_empty() {
            return vec![SortClause {
                field: RANK_FIELD.to_string(),
                direction: SortDirection::Desc,
            }];
        }

        descriptor
            .orders
            .iter()
            .map(|order| {
                let direction = match self.mode {
                    // Legacy drivers compared the column name, not the
                    // direction, against "direction".
                    SortDirectionMode::Literal => {
                        if order.column == "direction" {
                            SortDirection::Desc
                        } else {
                            SortDirection::Asc
                        }
                    }
                    SortDirectionMode::Canonical => order.direction,
                };
                SortClause {
                    field: order.column.clone(),
                    direction,
                }
            })
            .collect()
    }
}
