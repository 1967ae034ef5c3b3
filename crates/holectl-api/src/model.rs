// Canonical result shapes shared by both API generations
//
// v5 reports blocking as `{"status": "enabled"}`; v6 reports
// `{"blocking": "enabled" | true | ..., "timer": N}`. Adapters normalize
// both into `CanonicalStatus` so callers never care which one answered.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generation::Generation;

/// Blocking state of a Pi-hole, independent of API generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalStatus {
    pub blocking_enabled: bool,
    /// Seconds until blocking re-enables itself; `0` when enabled or
    /// disabled indefinitely.
    pub remaining_disable_seconds: u64,
}

impl CanonicalStatus {
    pub fn enabled() -> Self {
        Self {
            blocking_enabled: true,
            remaining_disable_seconds: 0,
        }
    }

    /// Normalize a v6 `/api/dns/blocking` body.
    ///
    /// `true` or `"enabled"` means enabled; every other value (including
    /// `"disabled"`, `"failed"`, `"unknown"`, or absence) means disabled.
    /// A missing or non-numeric `timer` is `0`.
    pub fn from_session_body(body: &Value) -> Self {
        let blocking_enabled = match body.get("blocking") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "enabled",
            _ => false,
        };
        Self {
            blocking_enabled,
            remaining_disable_seconds: body.get("timer").map_or(0, timer_secs),
        }
    }

    /// Normalize a v5 `api.php?status` body.
    ///
    /// Returns `None` when the body has no usable `status` field, which is
    /// what a non-v5 server answering on the legacy path looks like.
    pub fn from_legacy_body(body: &Value) -> Option<Self> {
        match body.get("status") {
            Some(Value::String(s)) if !s.is_empty() => Some(Self {
                blocking_enabled: s == "enabled",
                remaining_disable_seconds: 0,
            }),
            _ => None,
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn timer_secs(value: &Value) -> u64 {
    value.as_u64().unwrap_or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map_or(0, |f| f.round() as u64)
    })
}

/// Raw acknowledgement of an enable/disable call, tagged with the
/// generation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Acknowledgement {
    pub generation: Generation,
    pub raw: Value,
}

impl Acknowledgement {
    /// Best-effort read of the blocking state the server reported back.
    pub fn reported_status(&self) -> Option<CanonicalStatus> {
        match self.generation {
            Generation::Legacy => CanonicalStatus::from_legacy_body(&self.raw),
            Generation::SessionBased => self
                .raw
                .get("blocking")
                .map(|_| CanonicalStatus::from_session_body(&self.raw)),
        }
    }
}
