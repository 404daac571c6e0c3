// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP client for the hosted OpenSearch v3 OpenAPI.
//!
//! | Operation        | Request                                               |
//! |------------------|-------------------------------------------------------|
//! | `get_app`        | `GET  /v3/openapi/app-groups/{app}`                   |
//! | `create_app`     | `POST /v3/openapi/app-groups`                         |
//! | `push_documents` | `POST /v3/openapi/apps/{app}/{table}/actions/bulk`    |
//! | `execute_query`  | `GET  /v3/openapi/apps/{app}/search?query=...`        |
//! | `execute_suggest`| `GET  /v3/openapi/apps/{app}/suggest/{name}/search`   |
//!
//! Non-2xx answers are not errors here: their body is an envelope with
//! `status: FAIL` and is returned like any other.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use tracing::{debug, warn};

use super::envelope::RawResponse;
use super::signer::{encode_path, encode_query, RequestSigner};
use super::traits::SearchService;
use crate::config::OpenSearchConfig;
use crate::error::SyncError;
use crate::metrics::{self, LatencyTimer};
use crate::record::DocumentOperation;
use crate::schema::AppSchema;
use crate::search::{SearchParams, SuggestRequest};

const API_PREFIX: &str = "/v3/openapi";

pub struct HttpSearchService {
    client: reqwest::Client,
    base_url: String,
    signer: RequestSigner,
    debug: bool,
}

impl HttpSearchService {
    pub fn new(config: &OpenSearchConfig) -> Result<Self, SyncError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_host(&config.host),
            signer: RequestSigner::new(&config.access_key, &config.access_secret),
            debug: config.debug,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL with the query string encoded the way it was signed
    pub fn url_for(&self, path: &str, query: &[(String, String)]) -> String {
        let encoded = encode_query(query);
        if encoded.is_empty() {
            format!("{}{}", self.base_url, encode_path(path))
        } else {
            format!("{}{}?{}", self.base_url, encode_path(path), encoded)
        }
    }

    async fn send(
        &self,
        endpoint: &'static str,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<String>,
    ) -> Result<RawResponse, SyncError> {
        let _timer = LatencyTimer::new(endpoint);
        let body = body.unwrap_or_default();

        let nonce = generate_nonce();
        let headers = self
            .signer
            .sign(method.as_str(), path, query, &body, Utc::now(), &nonce)?;

        if self.debug {
            debug!(method = %method, path, body = %body, "OpenSearch request");
        }

        let mut request = self.client.request(method.clone(), self.url_for(path, query));
        for (name, value) in headers.to_pairs() {
            request = request.header(name, value);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                metrics::record_remote_call(endpoint, "error");
                warn!(method = %method, path, error = %e, "OpenSearch request failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            metrics::record_remote_call(endpoint, "error");
            SyncError::from(e)
        })?;

        metrics::record_remote_call(
            endpoint,
            if status.is_success() { "success" } else { "rejected" },
        );

        if self.debug {
            debug!(method = %method, path, status = status.as_u16(), body = %text, "OpenSearch response");
        }

        Ok(RawResponse::new(text))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Millisecond timestamp followed by four random digits
fn generate_nonce() -> String {
    let suffix = uuid::Uuid::new_v4().as_u128() % 9000 + 1000;
    format!("{}{}", Utc::now().timestamp_millis(), suffix)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, SyncError> {
    serde_json::to_string(value)
        .map_err(|e| SyncError::Config(format!("cannot encode request body: {}", e)))
}

#[async_trait]
impl SearchService for HttpSearchService {
    async fn get_app(&self, app_name: &str) -> Result<RawResponse, SyncError> {
        let path = format!("{}/app-groups/{}", API_PREFIX, app_name);
        self.send("get_app", Method::GET, &path, &[], None).await
    }

    async fn create_app(&self, schema: &AppSchema) -> Result<RawResponse, SyncError> {
        let path = format!("{}/app-groups", API_PREFIX);
        let body = to_json(&schema.to_create_body())?;
        self.send("create_app", Method::POST, &path, &[], Some(body)).await
    }

    async fn push_documents(
        &self,
        app_name: &str,
        table_name: &str,
        batch: &[DocumentOperation],
    ) -> Result<RawResponse, SyncError> {
        let path = format!("{}/apps/{}/{}/actions/bulk", API_PREFIX, app_name, table_name);
        let body = to_json(batch)?;
        self.send("push", Method::POST, &path, &[], Some(body)).await
    }

    async fn execute_query(&self, params: &SearchParams) -> Result<RawResponse, SyncError> {
        let path = format!("{}/apps/{}/search", API_PREFIX, params.app_name);
        self.send("search", Method::GET, &path, &params.to_request_params(), None)
            .await
    }

    async fn execute_suggest(&self, request: &SuggestRequest) -> Result<RawResponse, SyncError> {
        let path = format!(
            "{}/apps/{}/suggest/{}/search",
            API_PREFIX, request.app_name, request.suggest_name
        );
        self.send("suggest", Method::GET, &path, &request.to_request_params(), None)
            .await
    }
}
