//! Remote Application Schema
//!
//! Describes the search application created for a table and renders the
//! create-app request body.
//!
//! # Create request
//!
//! ```text
//! {
//!   "name": "goods", "type": "advance",
//!   "quota": {"docSize": 1, "computeResource": 20, "spec": "opensearch.share.common"},
//!   "schema": {
//!     "tables": {"goods": {"name": "goods", "primaryTable": true, "fields": {...}}},
//!     "indexes": {
//!       "searchFields": {"default": {"fields": ["title", "body"], "analyzer": "chn_standard"}},
//!       "filterFields": ["price", "status"]
//!     }
//!   }
//! }
//! ```

use serde_json::{json, Map, Value};

use super::translator::{translate_columns, FieldDescriptor, FieldType, TableMetadata};
use crate::error::SyncError;

/// Upper bound on TEXT fields ranked by the default query
pub const MAX_SEARCH_FIELDS: usize = 8;

/// Analyzer applied to the default search index
pub const DEFAULT_ANALYZER: &str = "chn_standard";

/// Resource quota requested when the application is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quota {
    /// Document storage, in the service's GB unit
    pub doc_size: u32,
    /// Compute units (LCU)
    pub compute_resource: u32,
    pub spec: String,
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            doc_size: 1,
            compute_resource: 20,
            spec: "opensearch.share.common".to_string(),
        }
    }
}

/// Search application definition derived from one table
#[derive(Debug, Clone, PartialEq)]
pub struct AppSchema {
    pub app_name: String,
    pub table_name: String,
    /// All columns, in column order
    pub fields: Vec<FieldDescriptor>,
    /// TEXT fields ranked by the `default` index (at most [`MAX_SEARCH_FIELDS`])
    pub search_fields: Vec<String>,
    /// Every non-TEXT, non-key field
    pub filter_fields: Vec<String>,
    pub analyzer: String,
    pub quota: Quota,
}

impl AppSchema {
    /// Derive the application schema for a table.
    ///
    /// TEXT fields beyond the first [`MAX_SEARCH_FIELDS`] stay in the field
    /// list (indexed) but are not ranked by the default query.
    pub fn from_table(app_name: impl Into<String>, meta: &TableMetadata) -> Result<Self, SyncError> {
        let fields = translate_columns(meta)?;

        let search_fields = fields
            .iter()
            .filter(|f| !f.is_primary_key && f.field_type == FieldType::Text)
            .take(MAX_SEARCH_FIELDS)
            .map(|f| f.name.clone())
            .collect();

        let filter_fields = fields
            .iter()
            .filter(|f| !f.is_primary_key && f.field_type != FieldType::Text)
            .map(|f| f.name.clone())
            .collect();

        Ok(Self {
            app_name: app_name.into(),
            table_name: meta.table_name.clone(),
            fields,
            search_fields,
            filter_fields,
            analyzer: DEFAULT_ANALYZER.to_string(),
            quota: Quota::default(),
        })
    }

    pub fn with_quota(mut self, quota: Quota) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = analyzer.into();
        self
    }

    pub fn primary_key(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.is_primary_key)
    }

    /// Render the create-app request body
    pub fn to_create_body(&self) -> Value {
        let mut fields = Map::new();
        for field in &self.fields {
            let mut def = json!({
                "name": field.name,
                "type": field.field_type.to_string(),
            });
            if field.is_primary_key {
                def["primaryKey"] = Value::Bool(true);
            }
            fields.insert(field.name.clone(), def);
        }

        let mut tables = Map::new();
        tables.insert(
            self.table_name.clone(),
            json!({
                "name": self.table_name,
                "primaryTable": true,
                "fields": fields,
            }),
        );

        json!({
            "name": self.app_name,
            "type": "advance",
            "quota": {
                "docSize": self.quota.doc_size,
                "computeResource": self.quota.compute_resource,
                "spec": self.quota.spec,
            },
            "schema": {
                "tables": tables,
                "indexes": {
                    "searchFields": {
                        "default": {
                            "fields": self.search_fields,
                            "analyzer": self.analyzer,
                        }
                    },
                    "filterFields": self.filter_fields,
                }
            }
        })
    }
}
