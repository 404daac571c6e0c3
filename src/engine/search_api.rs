//! Search API for the engine facade
//!
//! # Flow
//!
//! ```text
//! search(descriptor) / paginate(descriptor, per_page, page)
//!       │
//!       ├─→ QueryTranslator::build → SearchParams
//!       │
//!       └─→ SearchService::execute_query → RawResponse
//!                │
//!                ├─→ map_ids / total_count   (ResultMapper)
//!                │
//!                └─→ map: fetch_by_keys from the source, hydrate in result order
//! ```

use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;

use crate::error::SyncError;
use crate::metrics;
use crate::record::{IndexableRecord, PrimaryKey};
use crate::remote::{RawResponse, SearchService};
use crate::search::{extract_suggestions, QueryDescriptor, ResultMapper, SearchParams, SuggestRequest};
use crate::storage::RelationalSource;

use super::OpenSearchEngine;

impl<S, R> OpenSearchEngine<S, R>
where
    S: SearchService + ?Sized,
    R: RelationalSource + ?Sized,
{
    /// Search parameters for a descriptor, without sending anything
    pub fn build_query(&self, descriptor: &QueryDescriptor) -> SearchParams {
        self.translator.build(descriptor)
    }

    /// Run a search using the descriptor's own offset and limit
    pub async fn search(&self, descriptor: &QueryDescriptor) -> Result<RawResponse, SyncError> {
        let params = self.build_query(descriptor);
        let start = Instant::now();

        let raw = self.service.execute_query(&params).await?;

        debug!(
            app = %self.app_name,
            query = %params.query,
            start = params.start,
            hits = params.hits,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Search executed"
        );
        Ok(raw)
    }

    /// Run a search for page `page` (1-based) of `per_page` hits.
    ///
    /// The offset is `(page - 1) * per_page`; neither value is validated.
    pub async fn paginate(
        &self,
        descriptor: &QueryDescriptor,
        per_page: i64,
        page: i64,
    ) -> Result<RawResponse, SyncError> {
        let paged = descriptor
            .clone()
            .page(page.saturating_sub(1).saturating_mul(per_page), per_page);
        self.search(&paged).await
    }

    /// Primary keys of the hits, in result order
    pub fn map_ids(&self, raw: &RawResponse) -> Vec<PrimaryKey> {
        ResultMapper::extract_ids(raw, &self.model.key_name)
    }

    /// Total number of matches reported by the service
    pub fn total_count(&self, raw: &RawResponse) -> u64 {
        ResultMapper::extract_total(raw)
    }

    /// Load the records behind the hits from the source, in result order.
    ///
    /// Hits whose row no longer exists are dropped.
    pub async fn map(&self, raw: &RawResponse) -> Result<Vec<IndexableRecord>, SyncError> {
        let ids = self.map_ids(raw);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .source
            .fetch_by_keys(&self.model.table, &self.model.key_name, &ids)
            .await?;

        let fetched: HashMap<PrimaryKey, IndexableRecord> = rows
            .into_iter()
            .filter_map(|record| record.key(&self.model.key_name).map(|key| (key, record)))
            .collect();

        let hydrated = ResultMapper::hydrate(raw, &self.model.key_name, &fetched);
        metrics::record_search_results(hydrated.len());
        metrics::record_hydration_misses(ids.len().saturating_sub(hydrated.len()));
        Ok(hydrated)
    }

    /// Ask the configured suggester for completions of `term`
    pub async fn suggest(&self, term: &str) -> Result<RawResponse, SyncError> {
        let suggest_name = self
            .config
            .suggest_name
            .as_deref()
            .ok_or_else(|| SyncError::Config("suggest name is not configured".into()))?;

        let request = SuggestRequest::new(&self.app_name, suggest_name, term)
            .with_hits(self.config.suggest_hits);
        self.service.execute_suggest(&request).await
    }

    /// Suggestion strings for `term`
    pub async fn suggestions(&self, term: &str) -> Result<Vec<String>, SyncError> {
        let raw = self.suggest(term).await?;
        Ok(extract_suggestions(&raw))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::config::{OpenSearchConfig, SortDirectionMode};
    use crate::engine::{OpenSearchEngine, Searchable};
    use crate::error::SyncError;
    use crate::record::{IndexableRecord, PrimaryKey};
    use crate::remote::{MemorySearchService, RawResponse, RemoteCall};
    use crate::schema::ColumnMeta;
    use crate::search::{QueryDescriptor, SortDirection};
    use crate::storage::MemorySource;
    use crate::sync::ProvisionOutcome;

    type Engine = OpenSearchEngine<MemorySearchService, MemorySource>;

    fn setup(rows: i64, config: OpenSearchConfig) -> (Engine, Arc<MemorySearchService>, Arc<MemorySource>) {
        let source = Arc::new(MemorySource::new());
        source.create_table(
            "goods",
            "id",
            vec![
                ColumnMeta::new("id", "int"),
                ColumnMeta::new("title", "varchar(255)"),
                ColumnMeta::new("status", "tinyint"),
            ],
        );
        for i in 1..=rows {
            source
                .insert(
                    "goods",
                    IndexableRecord::new()
                        .with("id", json!(i))
                        .with("title", json!(format!("item {}", i)))
                        .with("status", json!(1)),
                )
                .unwrap();
        }

        let service = Arc::new(MemorySearchService::new());
        let engine = OpenSearchEngine::new(
            config,
            Searchable::new("goods", "id"),
            service.clone(),
            source.clone(),
        );
        (engine, service, source)
    }

    fn last_query(service: &MemorySearchService) -> crate::search::SearchParams {
        service
            .calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                RemoteCall::Query(params) => Some(params),
                _ => None,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_paginate_offset() {
        let (engine, service, _) = setup(0, OpenSearchConfig::default());

        engine.paginate(&QueryDescriptor::new("tea"), 15, 3).await.unwrap();
        let params = last_query(&service);
        assert_eq!(params.start, 30);
        assert_eq!(params.hits, 15);

        engine.paginate(&QueryDescriptor::new("tea"), 10, 1).await.unwrap();
        assert_eq!(last_query(&service).start, 0);
    }

    #[tokio::test]
    async fn test_paginate_extreme_pages_saturate() {
        let (engine, service, _) = setup(0, OpenSearchConfig::default());

        engine.paginate(&QueryDescriptor::new("tea"), 10, i64::MIN).await.unwrap();
        assert_eq!(last_query(&service).start, i64::MIN);

        engine.paginate(&QueryDescriptor::new("tea"), 10, i64::MAX).await.unwrap();
        assert_eq!(last_query(&service).start, i64::MAX);
    }

    #[tokio::test]
    async fn test_search_uses_app_name_and_sort_mode() {
        let config = OpenSearchConfig {
            app_name: Some("shop".into()),
            sort_direction_mode: SortDirectionMode::Canonical,
            ..Default::default()
        };
        let (engine, service, _) = setup(0, config);
        assert_eq!(engine.app_name(), "shop");

        engine
            .search(&QueryDescriptor::new("tea").order_by("price", SortDirection::Desc))
            .await
            .unwrap();
        let params = last_query(&service);
        assert_eq!(params.app_name, "shop");
        assert_eq!(params.sort[0].render(), "-price");
    }

    #[tokio::test]
    async fn test_import_then_map() {
        let (engine, service, source) = setup(5, OpenSearchConfig::default());

        let summary = engine.import_all().await.unwrap();
        assert_eq!(summary.documents, 5);
        assert_eq!(service.create_count(), 1);

        // A row deleted after indexing is dropped from the hydrated result
        source.remove("goods", &PrimaryKey::Int(2));

        let raw = engine.search(&QueryDescriptor::new("item")).await.unwrap();
        assert_eq!(engine.total_count(&raw), 5);
        assert_eq!(engine.map_ids(&raw).len(), 5);

        let records = engine.map(&raw).await.unwrap();
        let keys: Vec<PrimaryKey> = records.iter().filter_map(|r| r.key("id")).collect();
        assert_eq!(keys, vec![PrimaryKey::Int(1), PrimaryKey::Int(3), PrimaryKey::Int(4), PrimaryKey::Int(5)]);
    }

    #[tokio::test]
    async fn test_map_preserves_result_order() {
        let (engine, service, _) = setup(3, OpenSearchConfig::default());
        service.respond_to_query(json!({
            "status": "OK",
            "result": {"total": 3, "num": 3, "items": [
                {"fields": {"id": "3"}}, {"fields": {"id": "1"}}, {"fields": {"id": "2"}}
            ]}
        }));

        let raw = engine.search(&QueryDescriptor::new("x")).await.unwrap();
        let keys: Vec<PrimaryKey> = engine
            .map(&raw)
            .await
            .unwrap()
            .iter()
            .filter_map(|r| r.key("id"))
            .collect();
        assert_eq!(keys, vec![PrimaryKey::Int(3), PrimaryKey::Int(1), PrimaryKey::Int(2)]);
    }

    #[tokio::test]
    async fn test_map_of_empty_result_skips_source() {
        let (engine, _, _) = setup(0, OpenSearchConfig::default());
        let raw = RawResponse::from(r#"{"status":"OK","result":{"num":0,"items":[]}}"#);
        assert!(engine.map(&raw).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flush_twice_creates_once() {
        let (engine, service, _) = setup(0, OpenSearchConfig::default());
        assert_eq!(engine.flush().await.unwrap(), ProvisionOutcome::Created);
        assert_eq!(engine.flush().await.unwrap(), ProvisionOutcome::AlreadyExists);
        assert_eq!(service.create_count(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (engine, service, _) = setup(0, OpenSearchConfig::default());
        engine.flush().await.unwrap();

        let record = IndexableRecord::new().with("id", json!(7)).with("title", json!("tea"));
        engine.update(&[record.clone()]).await.unwrap();
        assert_eq!(service.document_count("goods"), 1);

        engine.delete(&[record]).await.unwrap();
        assert_eq!(service.document_count("goods"), 0);
    }

    #[tokio::test]
    async fn test_suggest_requires_name() {
        let (engine, _, _) = setup(0, OpenSearchConfig::default());
        assert!(matches!(engine.suggest("te").await, Err(SyncError::Config(_))));
    }

    #[tokio::test]
    async fn test_suggestions() {
        let config = OpenSearchConfig {
            suggest_name: Some("title_suggest".into()),
            suggest_hits: 5,
            ..Default::default()
        };
        let (engine, service, _) = setup(0, config);
        service.respond_to_suggest(r#"{"suggestions":[{"suggestion":"tea"},{"suggestion":"teapot"}]}"#);

        assert_eq!(engine.suggestions("te").await.unwrap(), vec!["tea", "teapot"]);
        match service.calls().last() {
            Some(RemoteCall::Suggest(request)) => {
                assert_eq!(request.suggest_name, "title_suggest");
                assert_eq!(request.hits, 5);
                assert_eq!(request.app_name, "goods");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
