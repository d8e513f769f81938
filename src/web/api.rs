//! JSON API handlers for the dashboard.
//!
//! Each handler maps one endpoint onto one store/telemetry/probe call and
//! returns an [`ApiReply`]. Handlers never fail: expected absences become
//! ordinary bodies, bad input becomes 400 and I/O errors become 500 with the
//! OS error text in `details`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::DashConfig;
use crate::probe::{self, LivenessProbe, RunState};
use crate::store::{self, ConfigStore, StoreError};
use crate::telemetry::{DEFAULT_LOG_LINES, SnapshotError, TelemetrySource};

// ---------------------------------------------------------------------------
// Context and reply
// ---------------------------------------------------------------------------

/// Everything a handler needs. Holds paths and the probe only; no data is
/// cached between requests.
pub struct ApiContext {
    pub store: ConfigStore,
    pub telemetry: TelemetrySource,
    pub probe: Box<dyn LivenessProbe>,
    pub service_name: String,
    pub log_lines: usize,
}

impl ApiContext {
    pub fn from_config(cfg: &DashConfig) -> Self {
        Self {
            store: ConfigStore::from_config(cfg),
            telemetry: TelemetrySource::from_config(cfg),
            probe: probe::from_config(cfg),
            service_name: cfg.service.name.clone(),
            log_lines: cfg.dashboard.log_lines,
        }
    }

    pub fn new(
        store: ConfigStore,
        telemetry: TelemetrySource,
        probe: Box<dyn LivenessProbe>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            telemetry,
            probe,
            service_name: service_name.into(),
            log_lines: DEFAULT_LOG_LINES,
        }
    }
}

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

impl ApiReply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn json<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(body) => Self::ok(body),
            Err(e) => Self::error(500, json!({ "error": "Serialization failed", "details": e.to_string() })),
        }
    }

    pub(crate) fn error(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn success() -> Self {
        Self::ok(json!({ "success": true }))
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// `POST /api/config/apps` body. Fields are kept loose so shape errors can be
/// reported as 400 instead of a parse failure.
#[derive(Debug, Deserialize)]
struct WeightUpdateRequest {
    domain: Option<Value>,
    weight: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct InterfacesRequest {
    interfaces: Option<Value>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/status`: run state of the generator service.
pub fn get_status(ctx: &ApiContext) -> ApiReply {
    match ctx.probe.query_status(&ctx.service_name) {
        RunState::Unknown => ApiReply::ok(json!({
            "status": RunState::Unknown,
            "error": "service manager not available",
        })),
        state => ApiReply::ok(json!({ "status": state })),
    }
}

/// `GET /api/stats`: the latest snapshot, validated.
pub fn get_stats(ctx: &ApiContext) -> ApiReply {
    match ctx.telemetry.snapshot() {
        Ok(snapshot) => ApiReply::json(&snapshot),
        Err(SnapshotError::Absent(_)) => ApiReply::ok(json!({ "error": "Stats not found" })),
        Err(SnapshotError::Parse(e)) => {
            tracing::debug!(error = %e, "stats snapshot rejected");
            ApiReply::ok(json!({ "error": "Invalid JSON" }))
        }
    }
}

/// `GET /api/config/apps`: all application rules.
pub fn get_apps(ctx: &ApiContext) -> ApiReply {
    match ctx.store.list_applications() {
        Ok(rules) => ApiReply::json(&rules),
        Err(StoreError::NotFound(_)) => ApiReply::ok(json!({ "error": "Config not found" })),
        Err(e) => {
            tracing::warn!(error = %e, "failed to list applications");
            ApiReply::error(500, json!({ "error": "Read failed", "details": e.to_string() }))
        }
    }
}

/// `POST /api/config/apps`: set one domain's weight.
///
/// Expects JSON body: `{ "domain": "google.com", "weight": 40 }`
pub fn post_apps(ctx: &ApiContext, body: &str) -> ApiReply {
    let Ok(req) = serde_json::from_str::<WeightUpdateRequest>(body) else {
        return missing_fields();
    };
    let (Some(domain), Some(weight)) = (req.domain, req.weight) else {
        return missing_fields();
    };
    let Some(domain) = domain.as_str().filter(|d| !d.is_empty()) else {
        return missing_fields();
    };
    if !store::is_valid_domain(domain) {
        return invalid_fields();
    }
    let Some(weight) = parse_weight_value(&weight) else {
        return invalid_fields();
    };

    match ctx.store.set_application_weight(domain, weight) {
        Ok(_) => ApiReply::success(),
        Err(StoreError::InvalidDomain(_)) => invalid_fields(),
        Err(StoreError::WriteFailed { source, .. }) => ApiReply::error(
            500,
            json!({ "error": "Write failed", "details": source.to_string() }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "weight update could not read apps file");
            ApiReply::error(500, json!({ "error": "Read failed" }))
        }
    }
}

/// `GET /api/config/interfaces`: interface list, `[]` when missing.
pub fn get_interfaces(ctx: &ApiContext) -> ApiReply {
    ApiReply::json(&ctx.store.list_interfaces())
}

/// `POST /api/config/interfaces`: replace the interface list.
///
/// Expects JSON body: `{ "interfaces": ["eth0", "eth1"] }`
pub fn post_interfaces(ctx: &ApiContext, body: &str) -> ApiReply {
    let Some(list) = serde_json::from_str::<InterfacesRequest>(body)
        .ok()
        .and_then(|req| req.interfaces)
        .and_then(|v| parse_interface_list(&v))
    else {
        return ApiReply::error(400, json!({ "error": "Invalid format" }));
    };

    match ctx.store.replace_interfaces(&list) {
        Ok(()) => ApiReply::success(),
        Err(e) => {
            let details = match &e {
                StoreError::WriteFailed { source, .. } => source.to_string(),
                other => other.to_string(),
            };
            ApiReply::error(500, json!({ "error": "Write failed", "details": details }))
        }
    }
}

/// `GET /api/logs`: log tail, `{logs: []}` when missing.
pub fn get_logs(ctx: &ApiContext) -> ApiReply {
    ApiReply::ok(json!({ "logs": ctx.telemetry.log_tail(ctx.log_lines) }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn missing_fields() -> ApiReply {
    ApiReply::error(400, json!({ "error": "Missing fields" }))
}

fn invalid_fields() -> ApiReply {
    ApiReply::error(400, json!({ "error": "Invalid fields" }))
}

/// A non-negative integer, or a string of decimal digits.
fn parse_weight_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                s.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// An array of single-line strings.
fn parse_interface_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| {
            item.as_str()
                .filter(|s| !s.contains(['\n', '\r']))
                .map(str::to_string)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_value_accepts_integers_and_digit_strings() {
        assert_eq!(parse_weight_value(&json!(40)), Some(40));
        assert_eq!(parse_weight_value(&json!(0)), Some(0));
        assert_eq!(parse_weight_value(&json!("15")), Some(15));
        assert_eq!(parse_weight_value(&json!(" 15 ")), Some(15));
    }

    #[test]
    fn weight_value_rejects_other_shapes() {
        assert_eq!(parse_weight_value(&json!(-1)), None);
        assert_eq!(parse_weight_value(&json!(2.5)), None);
        assert_eq!(parse_weight_value(&json!("abc")), None);
        assert_eq!(parse_weight_value(&json!("")), None);
        assert_eq!(parse_weight_value(&json!(null)), None);
        assert_eq!(parse_weight_value(&json!([1])), None);
    }

    #[test]
    fn interface_list_requires_single_line_strings() {
        assert_eq!(
            parse_interface_list(&json!(["eth0", "eth1"])),
            Some(vec!["eth0".to_string(), "eth1".to_string()])
        );
        assert_eq!(parse_interface_list(&json!([])), Some(Vec::new()));
        assert_eq!(parse_interface_list(&json!("eth0")), None);
        assert_eq!(parse_interface_list(&json!(["eth0", 3])), None);
        assert_eq!(parse_interface_list(&json!(["eth0\neth1"])), None);
    }

    #[test]
    fn weight_update_request_deserializes_partial_bodies() {
        let req: WeightUpdateRequest = serde_json::from_str(r#"{"domain": "a.com"}"#).unwrap();
        assert!(req.weight.is_none());
        let req: WeightUpdateRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(req.domain.is_none());
    }
}
