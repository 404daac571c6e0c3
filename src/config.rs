//! Configuration for the OpenSearch synchronization layer.
//!
//! Everything the layer needs is passed in explicitly at construction time:
//! credentials, endpoint, transport settings and the naming of the remote
//! application. Keys accept both `snake_case` and the `camelCase` spelling
//! used by the framework config this driver originally read from.
//!
//! # Example
//!
//! ```
//! use opensearch_sync::{OpenSearchConfig, SortDirectionMode};
//!
//! // Minimal config (uses defaults)
//! let config = OpenSearchConfig::default();
//! assert_eq!(config.timeout_ms, 10_000);
//! assert_eq!(config.page_size, 100);
//! assert_eq!(config.sort_direction_mode, SortDirectionMode::Literal);
//!
//! // Full config
//! let config = OpenSearchConfig {
//!     access_key: "LTAI-example".into(),
//!     access_secret: "secret".into(),
//!     host: "http://opensearch-cn-hangzhou.aliyuncs.com".into(),
//!     app_name: Some("goods".into()),
//!     suggest_name: Some("goods_suggest".into()),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;

use crate::error::SyncError;

/// How a sort spec's direction is derived when translating queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirectionMode {
    /// Descending only when the column is literally named `"direction"`,
    /// ascending otherwise. Matches the behaviour existing deployments rely on.
    #[default]
    Literal,
    /// Use the direction carried by each sort spec.
    Canonical,
}

/// Configuration for the OpenSearch synchronization layer.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenSearchConfig {
    /// Access key ID
    #[serde(default, alias = "accessKey")]
    pub access_key: String,

    /// Access key secret
    #[serde(default, alias = "accessSecret")]
    pub access_secret: String,

    /// API endpoint, e.g. "http://opensearch-cn-hangzhou.aliyuncs.com"
    #[serde(default)]
    pub host: String,

    /// Log every request and response body at debug level
    #[serde(default)]
    pub debug: bool,

    /// Transport timeout in milliseconds (default: 10s). No retries are made.
    #[serde(default = "default_timeout_ms", alias = "timeout")]
    pub timeout_ms: u64,

    /// Default remote application name (models may override)
    #[serde(default, alias = "appName")]
    pub app_name: Option<String>,

    /// Suggestion model name used by `suggest`
    #[serde(default, alias = "suggestName")]
    pub suggest_name: Option<String>,

    /// Number of suggestions requested per call
    #[serde(default = "default_suggest_hits")]
    pub suggest_hits: u32,

    /// Rows fetched per keyset page during a full reindex
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Bookkeeping columns stripped from every document before push
    #[serde(default = "default_excluded_fields")]
    pub excluded_fields: Vec<String>,

    /// Sort direction translation rule
    #[serde(default)]
    pub sort_direction_mode: SortDirectionMode,
}

fn default_timeout_ms() -> u64 { 10_000 }
fn default_suggest_hits() -> u32 { 10 }
fn default_page_size() -> usize { 100 }
fn default_excluded_fields() -> Vec<String> {
    vec!["created_at".into(), "updated_at".into(), "deleted_at".into()]
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            access_secret: String::new(),
            host: String::new(),
            debug: false,
            timeout_ms: default_timeout_ms(),
            app_name: None,
            suggest_name: None,
            suggest_hits: default_suggest_hits(),
            page_size: default_page_size(),
            excluded_fields: default_excluded_fields(),
            sort_direction_mode: SortDirectionMode::default(),
        }
    }
}

impl OpenSearchConfig {
    /// Check the settings a networked transport cannot work without.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.host.trim().is_empty() {
            return Err(SyncError::Config("opensearch host is not configured".into()));
        }
        if self.access_key.is_empty() || self.access_secret.is_empty() {
            return Err(SyncError::Config("opensearch credentials are not configured".into()));
        }
        if self.page_size == 0 {
            return Err(SyncError::Config("page_size must be greater than zero".into()));
        }
        Ok(())
    }
}
