// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Document Batcher
//!
//! Turns records into document operations and pushes them, one remote call
//! per batch.
//!
//! # Full reindex
//!
//! ```text
//! cursor = None
//! loop:
//!   page = source.fetch_after(table, key, cursor, page_size)   -- ascending by key
//!   page non-empty → push ADD batch, cursor = max key of page
//!   page.len() < page_size → done
//! ```
//!
//! Pages are pushed strictly in order and the first failure aborts the run.
//! Pages pushed before the failure stay pushed.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::OpenSearchConfig;
use crate::error::SyncError;
use crate::metrics;
use crate::record::{DocCommand, DocumentOperation, IndexableRecord, PrimaryKey};
use crate::remote::SearchService;
use crate::storage::RelationalSource;

/// Result of a completed full reindex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReindexSummary {
    /// Non-empty pages pushed
    pub pages: usize,
    pub documents: usize,
}

pub struct DocumentBatcher<S: ?Sized> {
    service: Arc<S>,
    excluded_fields: Vec<String>,
    page_size: usize,
}

impl<S: SearchService + ?Sized> DocumentBatcher<S> {
    pub fn new(service: Arc<S>, config: &OpenSearchConfig) -> Self {
        Self {
            service,
            excluded_fields: config.excluded_fields.clone(),
            page_size: config.page_size.max(1),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// One operation per record, bookkeeping fields stripped
    pub fn build_operations(&self, cmd: DocCommand, records: &[IndexableRecord]) -> Vec<DocumentOperation> {
        records
            .iter()
            .map(|record| DocumentOperation {
                cmd,
                fields: record.sanitized(&self.excluded_fields),
            })
            .collect()
    }

    /// Push ADD operations for `records`. No call is made for an empty slice.
    pub async fn index_batch(
        &self,
        records: &[IndexableRecord],
        table: &str,
        app: &str,
    ) -> Result<(), SyncError> {
        self.push(DocCommand::Add, records, table, app).await
    }

    /// Push DELETE operations for `records`. No call is made for an empty slice.
    pub async fn delete_batch(
        &self,
        records: &[IndexableRecord],
        table: &str,
        app: &str,
    ) -> Result<(), SyncError> {
        self.push(DocCommand::Delete, records, table, app).await
    }

    async fn push(
        &self,
        cmd: DocCommand,
        records: &[IndexableRecord],
        table: &str,
        app: &str,
    ) -> Result<(), SyncError> {
        if records.is_empty() {
            return Ok(());
        }

        let batch = self.build_operations(cmd, records);
        let envelope = self
            .service
            .push_documents(app, table, &batch)
            .await?
            .envelope();

        if envelope.is_failure() {
            let err = envelope.to_remote_error();
            warn!(app, table, cmd = cmd.as_str(), count = batch.len(), error = %err, "Document push rejected");
            return Err(err);
        }

        metrics::record_push(cmd.as_str(), batch.len());
        debug!(app, table, cmd = cmd.as_str(), count = batch.len(), "Documents pushed");
        Ok(())
    }

    /// Push every row of `table` as ADD operations, one keyset page per call.
    pub async fn reindex_all<R: RelationalSource + ?Sized>(
        &self,
        source: &R,
        table: &str,
        app: &str,
        key_column: &str,
    ) -> Result<ReindexSummary, SyncError> {
        let source_total = source.count(table).await?;
        let mut summary = ReindexSummary::default();
        let mut cursor: Option<PrimaryKey> = None;

        info!(app, table, source_total, page_size = self.page_size, "Reindex started");

        loop {
            let page = source
                .fetch_after(table, key_column, cursor.as_ref(), self.page_size)
                .await?;
            let fetched = page.len();

            if fetched > 0 {
                // Cursor follows the source's own ORDER BY: last row as returned
                let last = page
                    .last()
                    .and_then(|record| record.key(key_column))
                    .ok_or_else(|| {
                        SyncError::Source(format!("page of '{}' has no '{}' values", table, key_column))
                    })?;

                if cursor.as_ref() == Some(&last) {
                    return Err(SyncError::Source(format!(
                        "keyset cursor on '{}.{}' did not advance past {}",
                        table, key_column, last
                    )));
                }

                self.index_batch(&page, table, app).await?;

                summary.pages += 1;
                summary.documents += fetched;
                metrics::record_reindex_page(fetched);
                metrics::set_reindex_progress(summary.documents);
                info!(
                    app,
                    table,
                    pushed = fetched,
                    total_pushed = summary.documents,
                    source_total,
                    "Reindex page pushed"
                );

                cursor = Some(last);
            }

            if fetched < self.page_size {
                break;
            }
        }

        info!(app, table, pages = summary.pages, documents = summary.documents, "Reindex complete");
        Ok(summary)
    }
}
