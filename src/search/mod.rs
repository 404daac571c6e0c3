// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Infrastructure
//!
//! Query-time half of the adapter: builds vendor search requests and reads
//! the responses back into relational primary keys.
//!
//! # Architecture
//!
//! ```text
//! QueryDescriptor (builder)
//!     ↓
//! QueryTranslator → SearchParams → config=...&&query=...&&filter=...&&sort=...
//!     ↓
//! SearchService::execute_query → RawResponse
//!     ↓
//! ResultMapper → Vec<PrimaryKey> → hydrate against the relational source
//! ```
//!
//! # Example
//!
//! ```rust
//! use opensearch_sync::config::SortDirectionMode;
//! use opensearch_sync::search::{QueryDescriptor, QueryTranslator};
//!
//! let translator = QueryTranslator::new("goods", SortDirectionMode::Canonical);
//! let params = translator.build(
//!     &QueryDescriptor::new("tea").filter("status", 1).filter("category", 5),
//! );
//!
//! assert_eq!(params.filter.as_deref(), Some("status=1 AND category=5"));
//! assert_eq!(
//!     params.to_query_clause(),
//!     "config=start:0,hit:10,format:fulljson&&query=default:'tea'&&filter=status=1 AND category=5&&sort=-RANK"
//! );
//! ```

mod query;
mod result;
mod suggest;
mod translator;

pub use query::{FilterValue, QueryDescriptor, SortDirection, SortSpec, DEFAULT_LIMIT};
pub use result::ResultMapper;
pub use suggest::{extract_suggestions, SuggestRequest, DEFAULT_SUGGEST_HITS};
pub use translator::{
    QueryTranslator, SearchParams, SortClause, DEFAULT_INDEX, RANK_FIELD, RESULT_FORMAT,
};
