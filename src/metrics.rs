// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for opensearch-sync.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `opensearch_sync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `endpoint`: get_app, create_app, push, search, suggest
//! - `cmd`: ADD, DELETE
//! - `status`: success, error, rejected

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record one remote call and how it ended
pub fn record_remote_call(endpoint: &str, status: &str) {
    counter!(
        "opensearch_sync_remote_calls_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record remote call latency
pub fn record_latency(endpoint: &str, duration: Duration) {
    histogram!(
        "opensearch_sync_remote_call_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record documents pushed in one batch
pub fn record_push(cmd: &str, count: usize) {
    counter!(
        "opensearch_sync_documents_pushed_total",
        "cmd" => cmd.to_string()
    )
    .increment(count as u64);

    histogram!(
        "opensearch_sync_push_batch_size",
        "cmd" => cmd.to_string()
    )
    .record(count as f64);
}

/// Record a provisioning outcome (created, exists, error)
pub fn record_provision(outcome: &str) {
    counter!(
        "opensearch_sync_provision_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record one reindex page pushed
pub fn record_reindex_page(count: usize) {
    counter!("opensearch_sync_reindex_pages_total").increment(1);
    histogram!("opensearch_sync_reindex_page_size").record(count as f64);
}

/// Set reindex progress (documents pushed so far)
pub fn set_reindex_progress(pushed: usize) {
    gauge!("opensearch_sync_reindex_documents").set(pushed as f64);
}

/// Record hits returned by a search
pub fn record_search_results(count: usize) {
    histogram!("opensearch_sync_search_results").record(count as f64);
}

/// Record records dropped during hydration (deleted since indexing)
pub fn record_hydration_misses(count: usize) {
    if count > 0 {
        counter!("opensearch_sync_hydration_misses_total").increment(count as u64);
    }
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    endpoint: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.endpoint, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests verify the API doesn't panic without an installed recorder.

    #[test]
    fn test_record_remote_call() {
        record_remote_call("push", "success");
        record_remote_call("get_app", "error");
        record_remote_call("create_app", "rejected");
    }

    #[test]
    fn test_record_latency() {
        record_latency("search", Duration::from_millis(12));
    }

    #[test]
    fn test_record_counts() {
        record_push("ADD", 100);
        record_push("DELETE", 3);
        record_provision("created");
        record_reindex_page(100);
        set_reindex_progress(250);
        record_search_results(10);
        record_hydration_misses(0);
        record_hydration_misses(2);
    }

    #[test]
    fn test_latency_timer() {
        let timer = LatencyTimer::new("search");
        std::thread::sleep(Duration::from_millis(1));
        drop(timer);
    }
}
