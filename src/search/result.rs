//! Result Mapper
//!
//! Reads a `fulljson` search response back into relational primary keys.
//! Every accessor is defensive: a malformed or unexpected body maps to an
//! empty result instead of an error.
//!
//! ```text
//! {"status":"OK","result":{"total":42,"num":2,"items":[{"fields":{"id":"3"}},{"fields":{"id":"1"}}]}}
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::Value;

use crate::record::PrimaryKey;
use crate::remote::RawResponse;

/// Stateless mapper over raw search responses
pub struct ResultMapper;

impl ResultMapper {
    /// Parsed body, `Value::Null` when malformed
    pub fn parse(raw: &RawResponse) -> Value {
        raw.json()
    }

    /// Total number of matches reported by the service
    pub fn extract_total(raw: &RawResponse) -> u64 {
        read_count(&Self::parse(raw)["result"]["total"]).unwrap_or(0)
    }

    /// Primary keys of the returned items, in result order.
    ///
    /// Empty when the reported item count is zero or missing. Items without
    /// the key field are skipped.
    pub fn extract_ids(raw: &RawResponse, key_field: &str) -> Vec<PrimaryKey> {
        let body = Self::parse(raw);
        let result = &body["result"];

        if read_count(&result["num"]).unwrap_or(0) == 0 {
            return Vec::new();
        }

        let Some(items) = result["items"].as_array() else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| item_key(item, key_field))
            .collect()
    }

    /// Records for the returned keys, in result order.
    ///
    /// Hits carry keys as strings, so keys are matched on their text form:
    /// `"12"` finds `Int(12)`, `"007"` only finds `Text("007")`. Keys with no
    /// entry in `fetched` (deleted since indexing) are dropped.
    pub fn hydrate<R: Clone>(
        raw: &RawResponse,
        key_field: &str,
        fetched: &HashMap<PrimaryKey, R>,
    ) -> Vec<R> {
        let by_text: HashMap<Cow<'_, str>, &R> = fetched
            .iter()
            .map(|(key, record)| (key.as_text(), record))
            .collect();

        Self::extract_ids(raw, key_field)
            .iter()
            .filter_map(|key| by_text.get(key.as_text().as_ref()).map(|record| (*record).clone()))
            .collect()
    }
}

fn read_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn item_key(item: &Value, key_field: &str) -> Option<PrimaryKey> {
    let fields = item.get("fields")?.as_object()?;
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
