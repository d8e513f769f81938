//! Metrics derived from the latest snapshot on every render.

use crate::telemetry::StatsSnapshot;

/// Headline numbers shown on the metric cards.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub total_requests: u64,
    pub total_errors: u64,
    /// One decimal, no percent sign.
    pub success_rate: String,
    pub active_apps: usize,
}

impl DerivedMetrics {
    pub fn from_snapshot(snapshot: Option<&StatsSnapshot>) -> Self {
        let Some(snap) = snapshot else {
            return Self {
                total_requests: 0,
                total_errors: 0,
                success_rate: success_rate(0, 0),
                active_apps: 0,
            };
        };
        let total_errors = snap.total_errors();
        Self {
            total_requests: snap.total_requests,
            total_errors,
            success_rate: success_rate(snap.total_requests, total_errors),
            active_apps: snap.requests_by_app.len(),
        }
    }
}

/// `(total - errors) / total * 100` to one decimal. No traffic counts as
/// fully successful rather than dividing by zero.
pub fn success_rate(total_requests: u64, total_errors: u64) -> String {
    if total_requests == 0 {
        return "100.0".to_string();
    }
    let ok = total_requests as f64 - total_errors as f64;
    format!("{:.1}", ok / total_requests as f64 * 100.0)
}
