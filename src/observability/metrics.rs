//! Request counters
//!
//! - Counters only, monotonic, reset on process start
//! - Labelled by method, matched route and status class
//! - Shared across handlers behind an `Arc`

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::Serialize;

/// Label used for requests that matched no route
pub const UNMATCHED_ROUTE: &str = "unmatched";

type Labels = (String, String, &'static str);

/// Registry of HTTP request counters
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    requests: RwLock<BTreeMap<Labels, u64>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished request
    pub fn record_request(&self, method: &str, route: &str, status: u16) {
        let key = (method.to_string(), route.to_string(), status_class(status));
        *self.requests.write().entry(key).or_insert(0) += 1;
    }

    /// Count for one label set, 0 if never seen
    pub fn count(&self, method: &str, route: &str, class: &str) -> u64 {
        self.requests
            .read()
            .iter()
            .find(|((m, r, c), _)| m == method && r == route && *c == class)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.requests.read().values().sum()
    }

    /// Point-in-time copy of every counter, ordered by labels
    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests: Vec<RequestCount> = self
            .requests
            .read()
            .iter()
            .map(|((method, route, class), count)| RequestCount {
                method: method.clone(),
                route: route.clone(),
                status_class: class,
                count: *count,
            })
            .collect();

        MetricsSnapshot {
            total_requests: requests.iter().map(|r| r.count).sum(),
            requests,
        }
    }
}

/// One labelled counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCount {
    pub method: String,
    pub route: String,
    pub status_class: &'static str,
    pub count: u64,
}

/// Serializable view of the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub requests: Vec<RequestCount>,
}

/// `2xx`, `4xx` and so on
pub fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}
