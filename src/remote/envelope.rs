//! Response envelope returned by every remote endpoint.
//!
//! ```text
//! {"status": "OK",   "result": {...}, "errors": []}
//! {"status": "FAIL", "result": [],    "errors": [{"code": 2001, "message": "App not found"}]}
//! ```
//!
//! Parsing never fails: a body that is not JSON becomes an empty envelope
//! with no status, which classifies as neither success nor failure.

use serde_json::Value;

use crate::error::SyncError;

/// Error code reported when an application does not exist
pub const APP_NOT_FOUND_CODE: i64 = 2001;

/// Status marker of a rejected request
pub const STATUS_FAIL: &str = "FAIL";

/// Status marker of an accepted request
pub const STATUS_OK: &str = "OK";

const GENERIC_FAILURE: &str = "request to the search service failed";

/// Raw JSON body exactly as the service returned it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse(String);

impl RawResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn body(&self) -> &str {
        &self.0
    }

    pub fn into_body(self) -> String {
        self.0
    }

    /// Parsed body; `Value::Null` when the body is not JSON
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.0).unwrap_or(Value::Null)
    }

    pub fn envelope(&self) -> Envelope {
        Envelope::from_value(&self.json())
    }
}

impl From<String> for RawResponse {
    fn from(body: String) -> Self {
        Self(body)
    }
}

impl From<&str> for RawResponse {
    fn from(body: &str) -> Self {
        Self(body.to_string())
    }
}

impl From<Value> for RawResponse {
    fn from(body: Value) -> Self {
        Self(body.to_string())
    }
}

/// One entry of the `errors` array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteErrorDetail {
    pub code: i64,
    pub message: String,
}

/// Classified view over a response body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub status: Option<String>,
    pub result: Value,
    pub errors: Vec<RemoteErrorDetail>,
}

impl Envelope {
    pub fn parse(body: &str) -> Self {
        RawResponse::from(body).envelope()
    }

    pub fn from_value(value: &Value) -> Self {
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string);

        let errors = value
            .get("errors")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(parse_error_detail).collect())
            .unwrap_or_default();

        Self {
            status,
            result: value.get("result").cloned().unwrap_or(Value::Null),
            errors,
        }
    }

    /// Status is the failure marker
    pub fn is_failure(&self) -> bool {
        self.status.as_deref() == Some(STATUS_FAIL)
    }

    /// First error reports a missing application
    pub fn is_not_found(&self) -> bool {
        self.first_error()
            .map_or(false, |e| e.code == APP_NOT_FOUND_CODE)
    }

    pub fn first_error(&self) -> Option<&RemoteErrorDetail> {
        self.errors.first()
    }

    /// First error message, or a generic one when the service sent none
    pub fn error_message(&self) -> String {
        self.first_error()
            .map(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string())
    }

    /// `SyncError::Remote` built from the first error
    pub fn to_remote_error(&self) -> SyncError {
        SyncError::Remote {
            code: self.first_error().map_or(0, |e| e.code),
            message: self.error_message(),
        }
    }
}

fn parse_error_detail(entry: &Value) -> RemoteErrorDetail {
    let code = match entry.get("code") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    let message = entry
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    RemoteErrorDetail { code, message }
}
