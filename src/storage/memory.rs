use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::RelationalSource;
use crate::error::SyncError;
use crate::record::{IndexableRecord, PrimaryKey};
use crate::schema::ColumnMeta;

struct MemoryTable {
    columns: Vec<ColumnMeta>,
    key_column: String,
    rows: BTreeMap<PrimaryKey, IndexableRecord>,
}

/// In-memory relational source, keyed and ordered by primary key.
pub struct MemorySource {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Create (or replace) a table
    pub fn create_table(&self, table: &str, key_column: &str, columns: Vec<ColumnMeta>) {
        self.tables.write().insert(
            table.to_string(),
            MemoryTable {
                columns,
                key_column: key_column.to_string(),
                rows: BTreeMap::new(),
            },
        );
    }

    /// Insert or replace a row, keyed by the table's key column
    pub fn insert(&self, table: &str, record: IndexableRecord) -> Result<(), SyncError> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| unknown_table(table))?;
        let key = record.key(&t.key_column).ok_or_else(|| {
            SyncError::Source(format!("row has no '{}' value", t.key_column))
        })?;
        t.rows.insert(key, record);
        Ok(())
    }

    pub fn remove(&self, table: &str, key: &PrimaryKey) -> Option<IndexableRecord> {
        self.tables
            .write()
            .get_mut(table)
            .and_then(|t| t.rows.remove(key))
    }

    /// Row count, 0 for an unknown table
    #[must_use]
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.rows.len())
    }

    #[must_use]
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown_table(table: &str) -> SyncError {
    SyncError::Source(format!("unknown table '{}'", table))
}

fn check_key_column(t: &MemoryTable, table: &str, key_column: &str) -> Result<(), SyncError> {
    if t.key_column.eq_ignore_ascii_case(key_column) {
        Ok(())
    } else {
        Err(SyncError::Source(format!(
            "table '{}' is keyed by '{}', not '{}'",
            table, t.key_column, key_column
        )))
    }
}

#[async_trait]
impl RelationalSource for MemorySource {
    async fn columns(&self, table: &str) -> Result<Vec<ColumnMeta>, SyncError> {
        let tables = self.tables.read();
        let t = tables.get(table).ok_or_else(|| unknown_table(table))?;
        Ok(t.columns.clone())
    }

    async fn fetch_after(
        &self,
        table: &str,
        key_column: &str,
        after: Option<&PrimaryKey>,
        limit: usize,
    ) -> Result<Vec<IndexableRecord>, SyncError> {
        let tables = self.tables.read();
        let t = tables.get(table).ok_or_else(|| unknown_table(table))?;
        check_key_column(t, table, key_column)?;

        let lower = match after {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };

        Ok(t.rows
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn fetch_by_keys(
        &self,
        table: &str,
        key_column: &str,
        keys: &[PrimaryKey],
    ) -> Result<Vec<IndexableRecord>, SyncError> {
        let tables = self.tables.read();
        let t = tables.get(table).ok_or_else(|| unknown_table(table))?;
        check_key_column(t, table, key_column)?;

        // Keys may arrive as text from search hits; match on text form
        let by_text: HashMap<String, &IndexableRecord> = t
            .rows
            .iter()
            .map(|(key, record)| (key.as_text().into_owned(), record))
            .collect();

        Ok(keys
            .iter()
            .filter_map(|key| by_text.get(key.as_text().as_ref()).map(|record| (*record).clone()))
            .collect())
    }

    async fn count(&self, table: &str) -> Result<u64, SyncError> {
        let tables = self.tables.read();
        let t = tables.get(table).ok_or_else(|| unknown_table(table))?;
        Ok(t.rows.len() as u64)
    }
}
