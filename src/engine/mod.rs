// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search engine facade.
//!
//! [`OpenSearchEngine`] binds one [`Searchable`] model to a relational
//! source and a remote search service, and exposes the full driver surface:
//!
//! - write path: `update`, `delete`, `flush`, `import_all`
//! - read path: `search`, `paginate`, `map_ids`, `total_count`, `map`, `suggest`
//!
//! Every operation awaits its remote call before returning; nothing runs in
//! the background.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use opensearch_sync::{
//!     IndexableRecord, MemorySearchService, MemorySource, OpenSearchConfig,
//!     OpenSearchEngine, QueryDescriptor, Searchable,
//! };
//! use opensearch_sync::schema::ColumnMeta;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), opensearch_sync::SyncError> {
//! let source = Arc::new(MemorySource::new());
//! source.create_table("goods", "id", vec![
//!     ColumnMeta::new("id", "int"),
//!     ColumnMeta::new("title", "varchar(255)"),
//! ]);
//! source.insert("goods", IndexableRecord::new().with("id", json!(1)).with("title", json!("Green tea")))?;
//!
//! let engine = OpenSearchEngine::new(
//!     OpenSearchConfig::default(),
//!     Searchable::new("goods", "id"),
//!     Arc::new(MemorySearchService::new()),
//!     source,
//! );
//!
//! engine.import_all().await?;
//! let raw = engine.search(&QueryDescriptor::new("tea")).await?;
//! let records = engine.map(&raw).await?;
//! assert_eq!(records.len(), 1);
//! # Ok(())
//! # }
//! ```

mod api;
mod search_api;
mod types;

pub use types::Searchable;

use std::sync::Arc;

use tracing::debug;

use crate::config::OpenSearchConfig;
use crate::remote::SearchService;
use crate::search::QueryTranslator;
use crate::storage::RelationalSource;
use crate::sync::{AppProvisioner, DocumentBatcher};

/// Driver for one model: keeps its table in sync with the remote
/// application and answers searches against it.
pub struct OpenSearchEngine<S: ?Sized, R: ?Sized> {
    config: OpenSearchConfig,
    model: Searchable,
    app_name: String,
    service: Arc<S>,
    source: Arc<R>,
    translator: QueryTranslator,
    provisioner: AppProvisioner<S>,
    batcher: DocumentBatcher<S>,
}

impl<S, R> OpenSearchEngine<S, R>
where
    S: SearchService + ?Sized,
    R: RelationalSource + ?Sized,
{
    pub fn new(config: OpenSearchConfig, model: Searchable, service: Arc<S>, source: Arc<R>) -> Self {
        let app_name = model.app_name(config.app_name.as_deref());
        let translator = QueryTranslator::new(&app_name, config.sort_direction_mode);
        let provisioner = AppProvisioner::new(Arc::clone(&service));
        let batcher = DocumentBatcher::new(Arc::clone(&service), &config);

        debug!(
            app = %app_name,
            table = %model.table,
            key = %model.key_name,
            "Search engine created"
        );

        Self {
            config,
            model,
            app_name,
            service,
            source,
            translator,
            provisioner,
            batcher,
        }
    }

    /// Remote application this engine targets
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn model(&self) -> &Searchable {
        &self.model
    }

    pub fn config(&self) -> &OpenSearchConfig {
        &self.config
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    pub fn source(&self) -> &Arc<R> {
        &self.source
    }
}
