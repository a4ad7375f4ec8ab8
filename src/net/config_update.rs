//! Form-encoded configuration update (`POST /cfg`).
//!
//! The body is `key=value` pairs joined by `&`. Pairs are applied in order,
//! each one independently: a bad pair is reported and the rest still run.
//! Because a limit is checked against the *current* opposite limit, a
//! request carrying both a new min and max for one dimension can have one
//! accepted and the other rejected, depending on order.

use serde::Serialize;

use crate::config::{ConfigField, ConfigLimits, one_decimal};

use super::response::{Response, Status};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied {
    pub field: &'static str,
    #[serde(serialize_with = "one_decimal")]
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected {
    pub field: String,
    pub error: String,
}

/// Structured outcome of one update request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateReport {
    pub status: &'static str,
    pub message: &'static str,
    pub updates: Vec<Applied>,
    pub errors: Vec<Rejected>,
}

impl UpdateReport {
    fn new() -> Self {
        Self { status: "error", message: "", updates: Vec::new(), errors: Vec::new() }
    }

    /// Report for a request that could not be processed at all.
    pub fn failed(message: &'static str) -> Self {
        Self { message, ..Self::new() }
    }

    pub fn applied_any(&self) -> bool {
        !self.updates.is_empty()
    }

    fn finish(mut self) -> Self {
        if self.applied_any() {
            self.status = "success";
            self.message = "Configuration saved";
        } else {
            self.message = "No valid parameter applied";
        }
        self
    }

    pub fn into_response(self) -> Response {
        let status = if self.applied_any() { Status::Ok } else { Status::BadRequest };
        Response::json(status, &self)
    }
}

/// Non-empty `(key, value)` pairs, in body order. Pairs without `=` or
/// with an empty side are skipped.
pub fn pairs(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
}

/// Apply every pair of `body` to `limits`.
pub fn apply_update(limits: &mut ConfigLimits, body: &str) -> UpdateReport {
    let mut report = UpdateReport::new();

    for (key, raw) in pairs(body) {
        let Some(field) = ConfigField::from_key(key) else {
            report.errors.push(Rejected { field: key.into(), error: "unknown field".into() });
            continue;
        };
        let value = match raw.parse::<f32>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                report.errors.push(Rejected { field: key.into(), error: format!("invalid value: {raw}") });
                continue;
            }
        };
        match limits.apply(field, value) {
            Ok(()) => report.updates.push(Applied { field: field.key(), value }),
            Err(e) => report.errors.push(Rejected { field: key.into(), error: e.to_string() }),
        }
    }

    report.finish()
}
