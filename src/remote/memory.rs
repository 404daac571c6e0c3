//! In-process stand-in for the hosted search service.
//!
//! Keeps applications and their documents in memory, records every call in
//! order and lets tests script failures. Search requests are answered from
//! the stored documents with `start`/`hits` applied; the query, filter and
//! sort clauses are recorded but not evaluated.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Map, Value};

use super::envelope::{RawResponse, APP_NOT_FOUND_CODE, STATUS_FAIL, STATUS_OK};
use super::traits::SearchService;
use crate::error::SyncError;
use crate::record::{DocCommand, DocumentOperation, PrimaryKey};
use crate::schema::AppSchema;
use crate::search::{SearchParams, SuggestRequest};

/// Error code returned when a pushed document has no primary key
pub const MISSING_KEY_CODE: i64 = 4007;

/// One call received by [`MemorySearchService`]
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    GetApp(String),
    CreateApp(String),
    Push {
        app: String,
        table: String,
        batch: Vec<DocumentOperation>,
    },
    Query(SearchParams),
    Suggest(SuggestRequest),
}

#[derive(Default)]
struct Scripted {
    get_app: Option<RawResponse>,
    create_app: Option<RawResponse>,
    query: Option<RawResponse>,
    suggest: Option<RawResponse>,
    /// 1-based push number that answers FAIL
    fail_push: Option<(usize, i64, String)>,
    /// Every call fails at the transport level
    unreachable: bool,
}

pub struct MemorySearchService {
    apps: RwLock<HashMap<String, AppSchema>>,
    documents: RwLock<HashMap<String, BTreeMap<PrimaryKey, Map<String, Value>>>>,
    calls: Mutex<Vec<RemoteCall>>,
    scripted: Mutex<Scripted>,
}

impl MemorySearchService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            apps: RwLock::new(HashMap::new()),
            documents: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            scripted: Mutex::new(Scripted::default()),
        }
    }

    /// Register an application as if it had been provisioned earlier
    pub fn with_app(self, schema: AppSchema) -> Self {
        self.apps.write().insert(schema.app_name.clone(), schema);
        self
    }

    /// Answer `get_app` with a fixed body
    pub fn respond_to_get_app(&self, body: impl Into<RawResponse>) {
        self.scripted.lock().get_app = Some(body.into());
    }

    pub fn respond_to_create_app(&self, body: impl Into<RawResponse>) {
        self.scripted.lock().create_app = Some(body.into());
    }

    pub fn respond_to_query(&self, body: impl Into<RawResponse>) {
        self.scripted.lock().query = Some(body.into());
    }

    pub fn respond_to_suggest(&self, body: impl Into<RawResponse>) {
        self.scripted.lock().suggest = Some(body.into());
    }

    /// Make the `nth` push (1-based) answer with a FAIL envelope
    pub fn fail_push_on(&self, nth: usize, code: i64, message: impl Into<String>) {
        self.scripted.lock().fail_push = Some((nth, code, message.into()));
    }

    /// Fail every subsequent call with a transport error
    pub fn set_unreachable(&self, unreachable: bool) {
        self.scripted.lock().unreachable = unreachable;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Batches received by `push_documents`, in order
    pub fn pushed_batches(&self) -> Vec<Vec<DocumentOperation>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Push { batch, .. } => Some(batch.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn create_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, RemoteCall::CreateApp(_)))
            .count()
    }

    pub fn app(&self, app_name: &str) -> Option<AppSchema> {
        self.apps.read().get(app_name).cloned()
    }

    pub fn document_count(&self, app_name: &str) -> usize {
        self.documents.read().get(app_name).map_or(0, BTreeMap::len)
    }

    pub fn document(&self, app_name: &str, key: &PrimaryKey) -> Option<Map<String, Value>> {
        self.documents
            .read()
            .get(app_name)
            .and_then(|docs| docs.get(key).cloned())
    }

    fn record(&self, call: RemoteCall) -> Result<(), SyncError> {
        self.calls.lock().push(call);
        if self.scripted.lock().unreachable {
            return Err(SyncError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn push_number(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, RemoteCall::Push { .. }))
            .count()
    }

    fn key_field(&self, app_name: &str) -> String {
        self.apps
            .read()
            .get(app_name)
            .and_then(|schema| schema.primary_key().map(|f| f.name.clone()))
            .unwrap_or_else(|| "id".to_string())
    }
}

impl Default for MemorySearchService {
    fn default() -> Self {
        Self::new()
    }
}

fn ok(result: Value) -> RawResponse {
    RawResponse::from(json!({"status": STATUS_OK, "result": result, "errors": []}))
}

fn fail(code: i64, message: &str) -> RawResponse {
    RawResponse::from(json!({
        "status": STATUS_FAIL,
        "result": [],
        "errors": [{"code": code, "message": message}]
    }))
}

/// The service returns every field as a string
fn stringify(value: &Value) -> Value {
    match value {
        Value::String(_) | Value::Null => value.clone(),
        other => Value::String(other.to_string()),
    }
}

fn field_key(fields: &Map<String, Value>, key_field: &str) -> Option<PrimaryKey> {
    fields
        .get(key_field)
        .or_else(|| {
            fields
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key_field))
                .map(|(_, v)| v)
        })
        .and_then(PrimaryKey::from_value)
}

#[async_trait]
impl SearchService for MemorySearchService {
    async fn get_app(&self, app_name: &str) -> Result<RawResponse, SyncError> {
        self.record(RemoteCall::GetApp(app_name.to_string()))?;

        if let Some(body) = self.scripted.lock().get_app.clone() {
            return Ok(body);
        }

        Ok(match self.apps.read().get(app_name) {
            Some(schema) => ok(json!({"name": schema.app_name, "type": "advance"})),
            None => fail(APP_NOT_FOUND_CODE, "App not found"),
        })
    }

    async fn create_app(&self, schema: &AppSchema) -> Result<RawResponse, SyncError> {
        self.record(RemoteCall::CreateApp(schema.app_name.clone()))?;

        if let Some(body) = self.scripted.lock().create_app.clone() {
            return Ok(body);
        }

        self.apps
            .write()
            .insert(schema.app_name.clone(), schema.clone());
        Ok(ok(schema.to_create_body()))
    }

    async fn push_documents(
        &self,
        app_name: &str,
        table_name: &str,
        batch: &[DocumentOperation],
    ) -> Result<RawResponse, SyncError> {
        self.record(RemoteCall::Push {
            app: app_name.to_string(),
            table: table_name.to_string(),
            batch: batch.to_vec(),
        })?;

        let nth = self.push_number();
        if let Some((fail_on, code, message)) = self.scripted.lock().fail_push.clone() {
            if fail_on == nth {
                return Ok(fail(code, &message));
            }
        }

        if !self.apps.read().contains_key(app_name) {
            return Ok(fail(APP_NOT_FOUND_CODE, "App not found"));
        }

        let key_field = self.key_field(app_name);
        let mut keyed = Vec::with_capacity(batch.len());
        for op in batch {
            match field_key(&op.fields, &key_field) {
                Some(key) => keyed.push((key, op)),
                None => return Ok(fail(MISSING_KEY_CODE, "document has no primary key")),
            }
        }

        let mut documents = self.documents.write();
        let docs = documents.entry(app_name.to_string()).or_default();
        for (key, op) in keyed {
            match op.cmd {
                DocCommand::Add => {
                    docs.insert(key, op.fields.clone());
                }
                DocCommand::Delete => {
                    docs.remove(&key);
                }
            }
        }

        Ok(ok(Value::Null))
    }

    async fn execute_query(&self, params: &SearchParams) -> Result<RawResponse, SyncError> {
        self.record(RemoteCall::Query(params.clone()))?;

        if let Some(body) = self.scripted.lock().query.clone() {
            return Ok(body);
        }

        let documents = self.documents.read();
        let empty = BTreeMap::new();
        let docs = documents.get(&params.app_name).unwrap_or(&empty);

        let start = params.start.max(0) as usize;
        let hits = params.hits.max(0) as usize;
        let items: Vec<Value> = docs
            .values()
            .skip(start)
            .take(hits)
            .map(|fields| {
                let projected: Map<String, Value> = fields
                    .iter()
                    .filter(|(name, _)| {
                        params
                            .fetch_fields
                            .as_ref()
                            .map_or(true, |wanted| wanted.iter().any(|w| w == *name))
                    })
                    .map(|(name, value)| (name.clone(), stringify(value)))
                    .collect();
                json!({"fields": projected})
            })
            .collect();

        Ok(ok(json!({
            "searchtime": 0.0,
            "total": docs.len(),
            "num": items.len(),
            "viewtotal": docs.len(),
            "items": items,
        })))
    }

    async fn execute_suggest(&self, request: &SuggestRequest) -> Result<RawResponse, SyncError> {
        self.record(RemoteCall::Suggest(request.clone()))?;

        if let Some(body) = self.scripted.lock().suggest.clone() {
            return Ok(body);
        }

        Ok(RawResponse::from(json!({"suggestions": [], "errors": []})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortDirectionMode;
    use crate::remote::Envelope;
    use crate::schema::TableMetadata;
    use crate::search::{QueryDescriptor, QueryTranslator};

    fn goods_schema() -> AppSchema {
        let meta = TableMetadata::new("goods", "id")
            .column("id", "int")
            .column("title", "varchar(255)");
        AppSchema::from_table("goods", &meta).unwrap()
    }

    fn add(id: i64) -> DocumentOperation {
        let mut fields = Map::new();
        fields.insert("id".into(), json!(id));
        fields.insert("title".into(), json!(format!("item {}", id)));
        DocumentOperation::add(fields)
    }

    #[tokio::test]
    async fn test_unknown_app_is_not_found() {
        let service = MemorySearchService::new();
        let env = service.get_app("goods").await.unwrap().envelope();
        assert!(env.is_not_found());
        assert!(env.is_failure());
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = MemorySearchService::new();
        service.create_app(&goods_schema()).await.unwrap();

        let env = service.get_app("goods").await.unwrap().envelope();
        assert!(!env.is_failure());
        assert_eq!(service.create_count(), 1);
        assert!(service.app("goods").is_some());
    }

    #[tokio::test]
    async fn test_push_add_and_delete() {
        let service = MemorySearchService::new().with_app(goods_schema());

        service.push_documents("goods", "goods", &[add(1), add(2)]).await.unwrap();
        assert_eq!(service.document_count("goods"), 2);

        let mut key = Map::new();
        key.insert("id".into(), json!(1));
        service
            .push_documents("goods", "goods", &[DocumentOperation::delete(key)])
            .await
            .unwrap();
        assert_eq!(service.document_count("goods"), 1);
        assert!(service.document("goods", &PrimaryKey::Int(2)).is_some());
        assert_eq!(service.pushed_batches().len(), 2);
    }

    #[tokio::test]
    async fn test_push_without_key_fails() {
        let service = MemorySearchService::new().with_app(goods_schema());
        let mut fields = Map::new();
        fields.insert("title".into(), json!("orphan"));

        let env = service
            .push_documents("goods", "goods", &[DocumentOperation::add(fields)])
            .await
            .unwrap()
            .envelope();
        assert!(env.is_failure());
        assert_eq!(env.first_error().unwrap().code, MISSING_KEY_CODE);
    }

    #[tokio::test]
    async fn test_scripted_push_failure() {
        let service = MemorySearchService::new().with_app(goods_schema());
        service.fail_push_on(2, 3007, "quota exceeded");

        let first = service.push_documents("goods", "goods", &[add(1)]).await.unwrap();
        let second = service.push_documents("goods", "goods", &[add(2)]).await.unwrap();

        assert!(!first.envelope().is_failure());
        let env = Envelope::parse(second.body());
        assert!(env.is_failure());
        assert_eq!(env.error_message(), "quota exceeded");
    }

    #[tokio::test]
    async fn test_query_pages_and_stringifies() {
        let service = MemorySearchService::new().with_app(goods_schema());
        let batch: Vec<_> = (1..=5).map(add).collect();
        service.push_documents("goods", "goods", &batch).await.unwrap();

        let translator = QueryTranslator::new("goods", SortDirectionMode::Literal);
        let params = translator.build(&QueryDescriptor::new("item").fields(["id"]).page(1, 2));
        let body = service.execute_query(&params).await.unwrap().json();

        assert_eq!(body["result"]["total"], 5);
        assert_eq!(body["result"]["num"], 2);
        assert_eq!(body["result"]["items"][0]["fields"]["id"], "2");
        assert!(body["result"]["items"][0]["fields"].get("title").is_none());
    }

    #[tokio::test]
    async fn test_unreachable() {
        let service = MemorySearchService::new();
        service.set_unreachable(true);
        assert!(matches!(service.get_app("goods").await, Err(SyncError::Transport(_))));
        assert_eq!(service.calls().len(), 1);
    }
}
