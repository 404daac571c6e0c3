// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Relational → search schema mapping.
//!
//! Turns a table's column list into the field-type schema of a remote search
//! application: one primary key, up to eight ranked TEXT fields and every
//! non-TEXT field as a filter field.
//!
//! # Example
//!
//! ```
//! use opensearch_sync::schema::{AppSchema, FieldType, TableMetadata, infer_field_type};
//!
//! assert_eq!(infer_field_type("bigint(20)"), FieldType::Integer);
//! assert_eq!(infer_field_type("varchar(64)"), FieldType::Text);
//!
//! let table = TableMetadata::new("goods", "id")
//!     .column("id", "int")
//!     .column("title", "varchar(255)")
//!     .column("price", "decimal(10,2)");
//!
//! let schema = AppSchema::from_table("goods", &table).unwrap();
//! assert_eq!(schema.search_fields, vec!["title"]);
//! assert_eq!(schema.filter_fields, vec!["price"]);
//! ```

mod app_schema;
mod translator;

pub use app_schema::{AppSchema, Quota, DEFAULT_ANALYZER, MAX_SEARCH_FIELDS};
pub use translator::{
    infer_field_type, translate_columns, ColumnMeta, FieldDescriptor, FieldType, TableMetadata,
};
