use async_trait::async_trait;

use super::envelope::RawResponse;
use crate::error::SyncError;
use crate::record::DocumentOperation;
use crate::schema::AppSchema;
use crate::search::{SearchParams, SuggestRequest};

/// The hosted search service.
///
/// Every call returns the raw response body. Interpreting it (status,
/// error codes, result items) is left to [`Envelope`](super::Envelope) and
/// the result mapper. `Err` is reserved for failures to get an answer at all.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Look up an application by name
    async fn get_app(&self, app_name: &str) -> Result<RawResponse, SyncError>;

    async fn create_app(&self, schema: &AppSchema) -> Result<RawResponse, SyncError>;

    /// Push one batch of document operations to `table` of `app_name`
    async fn push_documents(
        &self,
        app_name: &str,
        table_name: &str,
        batch: &[DocumentOperation],
    ) -> Result<RawResponse, SyncError>;

    async fn execute_query(&self, params: &SearchParams) -> Result<RawResponse, SyncError>;

    async fn execute_suggest(&self, request: &SuggestRequest) -> Result<RawResponse, SyncError>;
}
