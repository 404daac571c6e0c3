//! Drop-down suggestions served by a named suggester of the application.

use serde_json::Value;

use crate::remote::RawResponse;

/// Suggestions requested when the config does not say otherwise
pub const DEFAULT_SUGGEST_HITS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestRequest {
    pub app_name: String,
    /// Suggester configured on the application
    pub suggest_name: String,
    pub query: String,
    pub hits: u32,
}

impl SuggestRequest {
    pub fn new(
        app_name: impl Into<String>,
        suggest_name: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            suggest_name: suggest_name.into(),
            query: query.into(),
            hits: DEFAULT_SUGGEST_HITS,
        }
    }

    pub fn with_hits(mut self, hits: u32) -> Self {
        self.hits = hits;
        self
    }

    pub fn to_request_params(&self) -> Vec<(String, String)> {
        vec![
            ("query".to_string(), self.query.clone()),
            ("hit".to_string(), self.hits.to_string()),
        ]
    }
}

/// Suggestion strings, in the order returned.
///
/// Accepts the list at the top level or under `result`; anything else is empty.
pub fn extract_suggestions(raw: &RawResponse) -> Vec<String> {
    let body = raw.json();
    let list = body
        .get("suggestions")
        .or_else(|| body.get("result").and_then(|r| r.get("suggestions")))
        .and_then(Value::as_array);

    match list {
        Some(entries) => entries
            .iter()
            .filter_map(|e| e.get("suggestion").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_params() {
        let req = SuggestRequest::new("goods", "title_suggest", "gre").with_hits(5);
        assert_eq!(
            req.to_request_params(),
            vec![
                ("query".to_string(), "gre".to_string()),
                ("hit".to_string(), "5".to_string())
            ]
        );
        assert_eq!(SuggestRequest::new("a", "b", "c").hits, DEFAULT_SUGGEST_HITS);
    }

    #[test]
    fn test_extract_suggestions() {
        let raw = RawResponse::from(
            r#"{"request_id":"x","suggestions":[{"suggestion":"green tea"},{"suggestion":"green apple"},{"other":1}]}"#,
        );
        assert_eq!(extract_suggestions(&raw), vec!["green tea", "green apple"]);
    }

    #[test]
    fn test_nested_and_malformed() {
        let nested = RawResponse::from(r#"{"result":{"suggestions":[{"suggestion":"tea"}]}}"#);
        assert_eq!(extract_suggestions(&nested), vec!["tea"]);
        assert!(extract_suggestions(&RawResponse::from("[]")).is_empty());
        assert!(extract_suggestions(&RawResponse::from("nope")).is_empty());
    }
}
