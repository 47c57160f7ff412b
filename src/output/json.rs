//! JSON response envelopes.
//!
//! Calculators answer with `{"networks": [...], "summary": {...}}` or
//! `{"error": {...}}`; summary routes with the route object or `null`.

use crate::api::SummaryRoute;
use crate::error::SubnetError;
use crate::exercise::ExerciseProblem;
use crate::processing::{AggregationEfficiency, ClassfulResult, VlsmResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

pub fn network_envelope<N: Serialize, S: Serialize>(networks: &N, summary: &S) -> Value {
    json!({ "networks": networks, "summary": summary })
}

pub fn error_envelope(error: &SubnetError) -> Value {
    json!({ "error": { "message": error.to_string(), "detail": error } })
}

pub fn classful_envelope(result: &Result<ClassfulResult, SubnetError>) -> Value {
    match result {
        Ok(r) => {
            let mut summary = json!(r.summary);
            summary["truncated"] = json!(r.truncated);
            network_envelope(&r.subnets, &summary)
        }
        Err(e) => error_envelope(e),
    }
}

pub fn vlsm_envelope(result: &Result<VlsmResult, SubnetError>) -> Value {
    match result {
        Ok(r) => network_envelope(&r.entries, &r.summary),
        Err(e) => error_envelope(e),
    }
}

pub fn summary_envelope(
    result: &Result<Option<SummaryRoute>, SubnetError>,
    efficiency: Option<&AggregationEfficiency>,
) -> Value {
    match result {
        Ok(Some(route)) => {
            let mut value = json!(route);
            if let Some(efficiency) = efficiency {
                value["efficiency"] = json!(efficiency);
            }
            value
        }
        Ok(None) => Value::Null,
        Err(e) => error_envelope(e),
    }
}

/// Problem, canonical solution and trace, stamped with the generation time.
pub fn exercise_envelope(problem: &ExerciseProblem, generated_at: DateTime<Utc>) -> Value {
    let mut value = json!(problem);
    value["generated_at"] = json!(generated_at.to_rfc3339());
    value
}

/// Pretty-printed JSON text.
pub fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}
