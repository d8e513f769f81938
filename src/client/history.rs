//! Rolling request history for the traffic chart.
//!
//! A fixed-capacity FIFO of [`HistoryPoint`]s derived from polled stats
//! snapshots. Once full, each push evicts the oldest point.

use std::collections::{BTreeMap, VecDeque};

use chrono::{Local, TimeZone};
use serde::Serialize;
use serde_json::Value;

/// Default number of points kept.
pub const DEFAULT_CAPACITY: usize = 20;

/// One chart point: formatted local time, total requests, and per-domain
/// request counts under `by_app`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryPoint {
    pub time: String,
    pub requests: u64,
    pub by_app: BTreeMap<String, u64>,
}

impl HistoryPoint {
    /// Derive a point from a `/api/stats` body.
    ///
    /// Returns `None` when the body has no usable `timestamp` (the
    /// `{"error": ...}` bodies, or a producer that has not written yet).
    pub fn from_stats(body: &Value) -> Option<Self> {
        let timestamp = body.get("timestamp").and_then(Value::as_f64)?;
        if timestamp <= 0.0 || !timestamp.is_finite() {
            return None;
        }

        let requests = body
            .get("total_requests")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let by_app = body
            .get("requests_by_app")
            .and_then(Value::as_object)
            .map(|apps| {
                apps.iter()
                    .filter_map(|(domain, count)| Some((domain.clone(), count.as_u64()?)))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            time: format_time(timestamp as i64),
            requests,
            by_app,
        })
    }
}

/// `HH:MM:SS` in local time.
fn format_time(epoch_secs: i64) -> String {
    match Local.timestamp_opt(epoch_secs, 0).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => epoch_secs.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct HistoryRing {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl HistoryRing {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, point: HistoryPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn point(requests: u64) -> HistoryPoint {
        HistoryPoint {
            time: requests.to_string(),
            requests,
            by_app: BTreeMap::new(),
        }
    }

    #[test]
    fn ring_keeps_most_recent_points() {
        let mut ring = HistoryRing::with_capacity(20);
        for i in 1..=25 {
            ring.push(point(i));
        }
        assert_eq!(ring.len(), 20);
        let requests: Vec<u64> = ring.iter().map(|p| p.requests).collect();
        assert_eq!(requests, (6..=25).collect::<Vec<_>>());
        assert_eq!(ring.latest().map(|p| p.requests), Some(25));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut ring = HistoryRing::with_capacity(0);
        ring.push(point(1));
        ring.push(point(2));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.capacity(), 1);
    }

    #[test]
    fn point_from_stats_nests_apps() {
        let body = json!({
            "timestamp": 1700000000,
            "total_requests": 42,
            "requests_by_app": {"google.com": 30, "github.com": 12},
            "errors_by_app": {}
        });
        let p = HistoryPoint::from_stats(&body).unwrap();
        assert_eq!(p.requests, 42);
        assert_eq!(p.time.len(), 8);

        let out = serde_json::to_value(&p).unwrap();
        assert_eq!(out["requests"], 42);
        assert_eq!(out["by_app"]["google.com"], 30);
        assert_eq!(out["by_app"]["github.com"], 12);
    }

    #[test]
    fn domains_named_like_point_fields_do_not_collide() {
        let body = json!({
            "timestamp": 1700000000,
            "total_requests": 9,
            "requests_by_app": {"time": 4, "requests": 5},
            "errors_by_app": {}
        });
        let p = HistoryPoint::from_stats(&body).unwrap();
        let out = serde_json::to_value(&p).unwrap();
        assert_eq!(out["requests"], 9);
        assert_eq!(out["time"], p.time.as_str());
        assert_eq!(out["by_app"]["time"], 4);
        assert_eq!(out["by_app"]["requests"], 5);
    }

    #[test]
    fn stats_without_timestamp_yield_nothing() {
        assert!(HistoryPoint::from_stats(&json!({"error": "Stats not found"})).is_none());
        assert!(HistoryPoint::from_stats(&json!({"timestamp": 0, "total_requests": 1})).is_none());
        assert!(HistoryPoint::from_stats(&json!({"timestamp": "soon"})).is_none());
    }
}
