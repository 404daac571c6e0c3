use async_trait::async_trait;

use crate::error::SyncError;
use crate::record::{IndexableRecord, PrimaryKey};
use crate::schema::{ColumnMeta, TableMetadata};

/// Read-only view of the relational source of truth.
///
/// Implementations must return `fetch_after` pages in ascending key order
/// under their own collation, keeping each key in its column's type;
/// reindexing continues after the last row of the page it receives.
#[async_trait]
pub trait RelationalSource: Send + Sync {
    /// Columns of `table` in declaration order
    async fn columns(&self, table: &str) -> Result<Vec<ColumnMeta>, SyncError>;

    /// Up to `limit` rows with `key_column > after`, ascending by key.
    /// `None` starts from the smallest key.
    async fn fetch_after(
        &self,
        table: &str,
        key_column: &str,
        after: Option<&PrimaryKey>,
        limit: usize,
    ) -> Result<Vec<IndexableRecord>, SyncError>;

    /// Rows whose key is in `keys`, in no particular order. Missing keys are
    /// simply absent from the result.
    async fn fetch_by_keys(
        &self,
        table: &str,
        key_column: &str,
        keys: &[PrimaryKey],
    ) -> Result<Vec<IndexableRecord>, SyncError>;

    async fn count(&self, table: &str) -> Result<u64, SyncError>;

    /// Column metadata bundled with the key column.
    /// Default implementation wraps `columns`.
    async fn table_metadata(&self, table: &str, key_column: &str) -> Result<TableMetadata, SyncError> {
        let columns = self.columns(table).await?;
        if columns.is_empty() {
            return Err(SyncError::Source(format!("table '{}' has no columns", table)));
        }
        Ok(TableMetadata::new(table, key_column).with_columns(columns))
    }
}

/// Reject identifiers that cannot be interpolated into SQL verbatim.
///
/// Only ASCII letters, digits and `_` are accepted.
pub fn validate_identifier(ident: &str) -> Result<&str, SyncError> {
    let valid = !ident.is_empty()
        && ident.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(ident)
    } else {
        Err(SyncError::InvalidIdentifier(ident.to_string()))
    }
}
