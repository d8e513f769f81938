//! The stats snapshot written by the traffic generator.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One point-in-time telemetry record.
///
/// The producer overwrites `stats.json` wholesale; there is no versioning
/// beyond `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Seconds since the Unix epoch. Fractional seconds are truncated.
    #[serde(deserialize_with = "epoch_seconds")]
    pub timestamp: u64,
    pub total_requests: u64,
    pub requests_by_app: BTreeMap<String, u64>,
    pub errors_by_app: BTreeMap<String, u64>,
}

impl StatsSnapshot {
    /// Sum of all per-app error counts, saturating at `u64::MAX`.
    pub fn total_errors(&self) -> u64 {
        self.errors_by_app
            .values()
            .copied()
            .fold(0u64, u64::saturating_add)
    }
}

/// Accept `1700000000` as well as `1700000000.25`.
fn epoch_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Number::deserialize(deserializer)?;
    if let Some(secs) = value.as_u64() {
        return Ok(secs);
    }
    match value.as_f64() {
        Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs as u64),
        _ => Err(serde::de::Error::custom(format!(
            "timestamp must be a non-negative number, got {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_errors_saturates_instead_of_overflowing() {
        let snap = StatsSnapshot {
            timestamp: 1,
            total_requests: 10,
            requests_by_app: BTreeMap::new(),
            errors_by_app: BTreeMap::from([
                ("a.com".to_string(), u64::MAX),
                ("b.com".to_string(), 1),
            ]),
        };
        assert_eq!(snap.total_errors(), u64::MAX);
    }

    #[test]
    fn parses_producer_output() {
        let json = r#"{
            "timestamp": 1700000000,
            "total_requests": 120,
            "requests_by_app": {"google.com": 100, "github.com": 20},
            "errors_by_app": {"google.com": 3, "github.com": 2}
        }"#;
        let snap: StatsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.timestamp, 1_700_000_000);
        assert_eq!(snap.requests_by_app["github.com"], 20);
        assert_eq!(snap.total_errors(), 5);
    }

    #[test]
    fn float_timestamp_is_truncated() {
        let json = r#"{"timestamp": 1700000000.75, "total_requests": 0,
            "requests_by_app": {}, "errors_by_app": {}}"#;
        let snap: StatsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.timestamp, 1_700_000_000);
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let json = r#"{"timestamp": 1, "total_requests": 0, "requests_by_app": {},
            "errors_by_app": {}, "uptime": 42}"#;
        let snap: StatsSnapshot = serde_json::from_str(json).unwrap();
        let out = serde_json::to_value(&snap).unwrap();
        assert!(out.get("uptime").is_none());
    }

    #[test]
    fn shape_mismatches_are_rejected() {
        for json in [
            r#"{"total_requests": 1, "requests_by_app": {}, "errors_by_app": {}}"#,
            r#"{"timestamp": "now", "total_requests": 1, "requests_by_app": {}, "errors_by_app": {}}"#,
            r#"{"timestamp": -5, "total_requests": 1, "requests_by_app": {}, "errors_by_app": {}}"#,
            r#"{"timestamp": 1, "total_requests": -1, "requests_by_app": {}, "errors_by_app": {}}"#,
            r#"{"timestamp": 1, "total_requests": 1, "requests_by_app": [], "errors_by_app": {}}"#,
            r#"{"timestamp": 1, "total_requests": 1, "requests_by_app": {"a": "x"}, "errors_by_app": {}}"#,
            r#"[1, 2, 3]"#,
        ] {
            assert!(
                serde_json::from_str::<StatsSnapshot>(json).is_err(),
                "accepted {json}"
            );
        }
    }
}
