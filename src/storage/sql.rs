// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL relational source.
//!
//! Reads the table being synchronized through sqlx's `Any` driver, so the
//! same code serves MySQL in production and SQLite in tests.
//!
//! Column metadata comes from the catalog:
//!
//! ```sql
//! -- MySQL
//! SELECT COLUMN_NAME AS name, COLUMN_TYPE AS sql_type
//!   FROM information_schema.COLUMNS
//!  WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
//!  ORDER BY ORDINAL_POSITION;
//!
//! -- SQLite
//! SELECT name, type AS sql_type FROM pragma_table_info(?) ORDER BY cid;
//! ```
//!
//! Reindexing pages by keyset, never by offset:
//!
//! ```sql
//! SELECT * FROM goods WHERE id > ? ORDER BY id ASC LIMIT ?
//! ```
//!
//! ## sqlx Any Driver Quirks
//!
//! The `Any` driver reports TEXT columns as BLOB on MySQL, so string values
//! are read as `String` first and `Vec<u8>` second. Table and column names
//! cannot be bound as parameters; they are validated and interpolated.

use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{any::AnyPoolOptions, any::AnyRow, AnyPool, Column, Row};
use tracing::debug;

use super::traits::{validate_identifier, RelationalSource};
use crate::error::SyncError;
use crate::record::{IndexableRecord, PrimaryKey};
use crate::schema::ColumnMeta;

// SQLx `Any` driver requires runtime installation
static INSTALL_DRIVERS: Once = Once::new();

fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| {
        sqlx::any::install_default_drivers();
    });
}

pub struct SqlSource {
    pool: AnyPool,
    is_sqlite: bool,
}

impl SqlSource {
    /// Connect to the source database.
    ///
    /// `sqlite::memory:` databases live per connection, so they get a
    /// single-connection pool.
    pub async fn connect(connection_string: &str) -> Result<Self, SyncError> {
        install_drivers();

        let is_sqlite = connection_string.starts_with("sqlite:");
        let max_connections = if connection_string.contains(":memory:") { 1 } else { 10 };

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .connect(connection_string)
            .await?;

        Ok(Self { pool, is_sqlite })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: AnyPool, is_sqlite: bool) -> Self {
        install_drivers();
        Self { pool, is_sqlite }
    }

    /// Get a clone of the connection pool for sharing with other stores.
    pub fn pool(&self) -> AnyPool {
        self.pool.clone()
    }

    fn columns_sql(&self) -> &'static str {
        if self.is_sqlite {
            "SELECT name, type AS sql_type FROM pragma_table_info(?) ORDER BY cid"
        } else {
            "SELECT COLUMN_NAME AS name, COLUMN_TYPE AS sql_type \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION"
        }
    }
}

/// Read a text column that the `Any` driver may surface as bytes
fn text_column(row: &AnyRow, column: &str) -> Result<String, SyncError> {
    row.try_get::<String, _>(column)
        .or_else(|_| {
            row.try_get::<Vec<u8>, _>(column)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        })
        .map_err(SyncError::from)
}

/// Convert one cell to a JSON scalar.
///
/// Tries integer, float, boolean, text then bytes; NULL and anything
/// undecodable become `null`.
fn cell_value(row: &AnyRow, index: usize) -> Value {
    match row.try_get::<Option<i64>, _>(index) {
        Ok(Some(i)) => return Value::from(i),
        Ok(None) => return Value::Null,
        Err(_) => {}
    }
    if let Ok(Some(x)) = row.try_get::<Option<f64>, _>(index) {
        return serde_json::Number::from_f64(x).map_or(Value::Null, Value::Number);
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(index) {
        return Value::from(i64::from(b));
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(index) {
        return Value::String(s);
    }
    if let Ok(Some(bytes)) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return Value::String(String::from_utf8_lossy(&bytes).into_owned());
    }
    Value::Null
}

fn row_to_record(row: &AnyRow) -> IndexableRecord {
    let mut record = IndexableRecord::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.insert(column.name(), cell_value(row, index));
    }
    record
}

#[async_trait]
impl RelationalSource for SqlSource {
    async fn columns(&self, table: &str) -> Result<Vec<ColumnMeta>, SyncError> {
        let table = validate_identifier(table)?;

        let rows = sqlx::query(self.columns_sql())
            .bind(table.to_string())
            .fetch_all(&self.pool)
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(ColumnMeta::new(
                text_column(row, "name")?,
                text_column(row, "sql_type")?,
            ));
        }

        debug!(table, columns = columns.len(), "Read column metadata");
        Ok(columns)
    }

    async fn fetch_after(
        &self,
        table: &str,
        key_column: &str,
        after: Option<&PrimaryKey>,
        limit: usize,
    ) -> Result<Vec<IndexableRecord>, SyncError> {
        let table = validate_identifier(table)?;
        let key = validate_identifier(key_column)?;

        let rows = match after {
            None => {
                let sql = format!("SELECT * FROM {table} ORDER BY {key} ASC LIMIT ?");
                sqlx::query(&sql)
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(cursor) => {
                let sql = format!("SELECT * FROM {table} WHERE {key} > ? ORDER BY {key} ASC LIMIT ?");
                let query = match cursor {
                    PrimaryKey::Int(i) => sqlx::query(&sql).bind(*i),
                    PrimaryKey::Text(s) => sqlx::query(&sql).bind(s.clone()),
                };
                query.bind(limit as i64).fetch_all(&self.pool).await?
            }
        };

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn fetch_by_keys(
        &self,
        table: &str,
        key_column: &str,
        keys: &[PrimaryKey],
    ) -> Result<Vec<IndexableRecord>, SyncError> {
        let table = validate_identifier(table)?;
        let key = validate_identifier(key_column)?;

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!("SELECT * FROM {table} WHERE {key} IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for k in keys {
            query = match k {
                PrimaryKey::Int(i) => query.bind(*i),
                PrimaryKey::Text(s) => query.bind(s.clone()),
            };
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count(&self, table: &str) -> Result<u64, SyncError> {
        let table = validate_identifier(table)?;
        let sql = format!("SELECT COUNT(*) AS cnt FROM {table}");

        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("cnt")?;

        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{infer_field_type, FieldType};

    async fn seeded_source(rows: i64) -> SqlSource {
        let source = SqlSource::connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            "CREATE TABLE goods (
                id INTEGER PRIMARY KEY,
                title VARCHAR(255) NOT NULL,
                price DECIMAL(10,2),
                status TINYINT NOT NULL DEFAULT 1,
                note TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT '2024-01-01 00:00:00'
            )",
        )
        .execute(&source.pool())
        .await
        .unwrap();

        for i in 1..=rows {
            sqlx::query("INSERT INTO goods (id, title, price, status) VALUES (?, ?, ?, ?)")
                .bind(i)
                .bind(format!("item {}", i))
                .bind(i as f64 * 1.5)
                .bind(i % 2)
                .execute(&source.pool())
                .await
                .unwrap();
        }
        source
    }

    #[tokio::test]
    async fn test_columns_from_pragma() {
        let source = seeded_source(0).await;
        let columns = source.columns("goods").await.unwrap();

        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title", "price", "status", "note", "created_at"]);
        assert_eq!(infer_field_type(&columns[0].sql_type), FieldType::Integer);
        assert_eq!(infer_field_type(&columns[1].sql_type), FieldType::Text);
        assert_eq!(infer_field_type(&columns[2].sql_type), FieldType::Float);
        assert_eq!(infer_field_type(&columns[5].sql_type), FieldType::Literal);
    }

    #[tokio::test]
    async fn test_keyset_paging() {
        let source = seeded_source(25).await;

        let first = source.fetch_after("goods", "id", None, 10).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].key("id"), Some(PrimaryKey::Int(1)));
        assert_eq!(first[9].key("id"), Some(PrimaryKey::Int(10)));
        assert_eq!(first[0].get("title"), Some(&Value::from("item 1")));

        let last = source
            .fetch_after("goods", "id", Some(&PrimaryKey::Int(20)), 10)
            .await
            .unwrap();
        assert_eq!(last.len(), 5);
        assert_eq!(last[0].key("id"), Some(PrimaryKey::Int(21)));
    }

    #[tokio::test]
    async fn test_null_cells_become_null() {
        let source = seeded_source(1).await;
        let rows = source.fetch_after("goods", "id", None, 1).await.unwrap();
        assert_eq!(rows[0].get("note"), Some(&Value::Null));
        assert_eq!(rows[0].get("created_at"), Some(&Value::from("2024-01-01 00:00:00")));
    }

    #[tokio::test]
    async fn test_fetch_by_keys() {
        let source = seeded_source(5).await;

        let rows = source
            .fetch_by_keys("goods", "id", &[PrimaryKey::Int(4), PrimaryKey::Int(2), PrimaryKey::Int(42)])
            .await
            .unwrap();
        let mut keys: Vec<PrimaryKey> = rows.iter().filter_map(|r| r.key("id")).collect();
        keys.sort();
        assert_eq!(keys, vec![PrimaryKey::Int(2), PrimaryKey::Int(4)]);

        assert!(source.fetch_by_keys("goods", "id", &[]).await.unwrap().is_empty());
    }

    async fn sku_source(keys: &[String]) -> SqlSource {
        let source = SqlSource::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE skus (sku VARCHAR(16) PRIMARY KEY, title VARCHAR(64) NOT NULL)")
            .execute(&source.pool())
            .await
            .unwrap();

        for key in keys {
            sqlx::query("INSERT INTO skus (sku, title) VALUES (?, ?)")
                .bind(key.clone())
                .bind(format!("sku {}", key))
                .execute(&source.pool())
                .await
                .unwrap();
        }
        source
    }

    #[tokio::test]
    async fn test_varchar_keys_stay_text() {
        let keys: Vec<String> = (1..=120).map(|i| i.to_string()).collect();
        let source = sku_source(&keys).await;

        let first = source.fetch_after("skus", "sku", None, 4).await.unwrap();
        let page: Vec<PrimaryKey> = first.iter().filter_map(|r| r.key("sku")).collect();
        assert_eq!(
            page,
            vec![
                PrimaryKey::from("1"),
                PrimaryKey::from("10"),
                PrimaryKey::from("100"),
                PrimaryKey::from("101"),
            ]
        );

        let next = source
            .fetch_after("skus", "sku", Some(&PrimaryKey::from("101")), 1)
            .await
            .unwrap();
        assert_eq!(next[0].key("sku"), Some(PrimaryKey::from("102")));
    }

    #[tokio::test]
    async fn test_reindex_varchar_keys_in_text_order() {
        use std::sync::Arc;

        use crate::config::OpenSearchConfig;
        use crate::remote::MemorySearchService;
        use crate::schema::{AppSchema, TableMetadata};
        use crate::sync::DocumentBatcher;

        let keys: Vec<String> = (1..=120).map(|i| i.to_string()).collect();
        let source = sku_source(&keys).await;

        let meta = TableMetadata::new("skus", "sku")
            .column("sku", "varchar(16)")
            .column("title", "varchar(64)");
        let service = Arc::new(MemorySearchService::new().with_app(AppSchema::from_table("skus", &meta).unwrap()));

        let summary = DocumentBatcher::new(service.clone(), &OpenSearchConfig::default())
            .with_page_size(10)
            .reindex_all(&source, "skus", "skus", "sku")
            .await
            .unwrap();

        assert_eq!(summary.documents, 120);
        assert_eq!(summary.pages, 12);
        assert_eq!(service.document_count("skus"), 120);
        assert!(service.document("skus", &PrimaryKey::from("99")).is_some());
    }

    #[tokio::test]
    async fn test_fetch_by_keys_leading_zero_and_text_hits() {
        let source = sku_source(&["007".to_string(), "7".to_string()]).await;

        let rows = source
            .fetch_by_keys("skus", "sku", &[PrimaryKey::from("007")])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key("sku"), Some(PrimaryKey::from("007")));

        // Integer columns still match keys reported as strings
        let goods = seeded_source(3).await;
        let rows = goods
            .fetch_by_keys("goods", "id", &[PrimaryKey::from("2")])
            .await
            .unwrap();
        assert_eq!(rows[0].key("id"), Some(PrimaryKey::Int(2)));
    }

    #[tokio::test]
    async fn test_count() {
        let source = seeded_source(7).await;
        assert_eq!(source.count("goods").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_identifiers_are_validated() {
        let source = seeded_source(0).await;
        assert!(matches!(
            source.count("goods; DROP TABLE goods").await,
            Err(SyncError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            source.fetch_after("goods", "id)--", None, 1).await,
            Err(SyncError::InvalidIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_table_is_source_error() {
        let source = seeded_source(0).await;
        assert!(matches!(source.count("missing").await, Err(SyncError::Source(_))));
        // The pragma simply returns no rows for an unknown table
        assert!(source.columns("missing").await.unwrap().is_empty());
    }
}
