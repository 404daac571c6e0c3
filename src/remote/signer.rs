//! Request signing for the OpenSearch v3 OpenAPI.
//!
//! ```text
//! StringToSign = METHOD "\n"
//!              + Content-MD5 "\n"          (hex md5 of the body, empty for no body)
//!              + Content-Type "\n"
//!              + Date "\n"                 (UTC, 2024-01-02T03:04:05Z)
//!              + CanonicalizedHeaders      (x-opensearch-* lowercased, sorted, "k:v\n")
//!              + CanonicalizedResource     (encoded path, "?" + sorted "k=v" joined by "&")
//!
//! Authorization: OPENSEARCH <AccessKey>:base64(hmac_sha1(AccessSecret, StringToSign))
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;

use crate::error::SyncError;

type HmacSha1 = Hmac<Sha1>;

pub const CONTENT_TYPE: &str = "application/json";
pub const NONCE_HEADER: &str = "X-Opensearch-Nonce";

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Headers to attach to one signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub content_md5: String,
    pub content_type: String,
    pub date: String,
    pub nonce: String,
    pub authorization: String,
}

impl SignedHeaders {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("Content-Type", self.content_type.clone()),
            ("Date", self.date.clone()),
            (NONCE_HEADER, self.nonce.clone()),
            ("Authorization", self.authorization.clone()),
        ];
        if !self.content_md5.is_empty() {
            pairs.push(("Content-MD5", self.content_md5.clone()));
        }
        pairs
    }
}

#[derive(Clone)]
pub struct RequestSigner {
    access_key: String,
    access_secret: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("access_key", &self.access_key)
            .field("access_secret", &"***")
            .finish()
    }
}

impl RequestSigner {
    pub fn new(access_key: impl Into<String>, access_secret: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            access_secret: access_secret.into(),
        }
    }

    /// Sign a request. Deterministic for a fixed `date` and `nonce`.
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        query: &[(String, String)],
        body: &str,
        date: DateTime<Utc>,
        nonce: &str,
    ) -> Result<SignedHeaders, SyncError> {
        let content_md5 = content_md5(body);
        let date = date.format(DATE_FORMAT).to_string();

        let string_to_sign = string_to_sign(
            method,
            &content_md5,
            CONTENT_TYPE,
            &date,
            &[(NONCE_HEADER, nonce)],
            &canonical_resource(path, query),
        );

        let mut mac = HmacSha1::new_from_slice(self.access_secret.as_bytes())
            .map_err(|e| SyncError::Config(format!("invalid access secret: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        Ok(SignedHeaders {
            content_md5,
            content_type: CONTENT_TYPE.to_string(),
            date,
            nonce: nonce.to_string(),
            authorization: format!("OPENSEARCH {}:{}", self.access_key, signature),
        })
    }
}

/// Hex md5 of the body, empty for an empty body
pub fn content_md5(body: &str) -> String {
    if body.is_empty() {
        return String::new();
    }
    Md5::digest(body.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

pub fn string_to_sign(
    method: &str,
    content_md5: &str,
    content_type: &str,
    date: &str,
    headers: &[(&str, &str)],
    resource: &str,
) -> String {
    let mut canonical: Vec<(String, String)> = headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
        .filter(|(k, v)| k.starts_with("x-opensearch-") && !v.is_empty())
        .collect();
    canonical.sort();

    let mut out = format!(
        "{}\n{}\n{}\n{}\n",
        method.to_ascii_uppercase(),
        content_md5,
        content_type,
        date
    );
    for (k, v) in canonical {
        out.push_str(&k);
        out.push(':');
        out.push_str(&v);
        out.push('\n');
    }
    out.push_str(resource);
    out
}

/// Encoded path plus sorted, encoded query parameters
pub fn canonical_resource(path: &str, query: &[(String, String)]) -> String {
    let mut resource = encode_path(path);
    let query = encode_query(query);
    if !query.is_empty() {
        resource.push('?');
        resource.push_str(&query);
    }
    resource
}

/// Query string with keys sorted; parameters with empty values are left out
pub fn encode_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (raw_url_encode(k), raw_url_encode(v)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn encode_path(path: &str) -> String {
    raw_url_encode(path).replace("%2F", "/")
}

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - _ . ~`
pub fn raw_url_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}
