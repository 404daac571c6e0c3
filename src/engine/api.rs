//! Write path of the engine facade.

use tracing::info;

use crate::error::SyncError;
use crate::record::IndexableRecord;
use crate::remote::SearchService;
use crate::schema::TableMetadata;
use crate::storage::RelationalSource;
use crate::sync::{ProvisionOutcome, ReindexSummary};

use super::OpenSearchEngine;

impl<S, R> OpenSearchEngine<S, R>
where
    S: SearchService + ?Sized,
    R: RelationalSource + ?Sized,
{
    /// Index (insert or replace) the given records. One remote call.
    pub async fn update(&self, records: &[IndexableRecord]) -> Result<(), SyncError> {
        self.batcher
            .index_batch(records, &self.model.table, &self.app_name)
            .await
    }

    /// Remove the given records from the index. One remote call.
    pub async fn delete(&self, records: &[IndexableRecord]) -> Result<(), SyncError> {
        self.batcher
            .delete_batch(records, &self.model.table, &self.app_name)
            .await
    }

    /// Column metadata of the model's table, as read from the source
    pub async fn table_metadata(&self) -> Result<TableMetadata, SyncError> {
        self.source
            .table_metadata(&self.model.table, &self.model.key_name)
            .await
    }

    /// Provision the remote application from the table's columns.
    ///
    /// A no-op when the application already exists.
    pub async fn flush(&self) -> Result<ProvisionOutcome, SyncError> {
        let meta = self.table_metadata().await?;
        self.provisioner.ensure_app(&self.app_name, &meta).await
    }

    /// Provision the application, then push every row of the table.
    pub async fn import_all(&self) -> Result<ReindexSummary, SyncError> {
        let outcome = self.flush().await?;
        info!(app = %self.app_name, outcome = ?outcome, "Full import starting");

        self.batcher
            .reindex_all(
                self.source.as_ref(),
                &self.model.table,
                &self.app_name,
                &self.model.key_name,
            )
            .await
    }
}
