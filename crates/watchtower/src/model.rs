use serde::{Deserialize, Serialize};

use crate::classifier::classify;
use crate::prober::ProbeResult;

/// Reserved key prefix for target records. URLs must not start with it.
pub const KEY_PREFIX: &str = "websites_";

/// Lowest accepted check interval, in seconds.
pub const DEFAULT_MIN_FREQUENCY: u64 = 60;

/// Store key of the record monitoring `url`.
pub fn target_key(url: &str) -> String {
    format!("{KEY_PREFIX}{url}")
}

/// Raise `requested` to `floor` when it is below it.
pub fn clamp_frequency(requested: u64, floor: u64) -> u64 {
    requested.max(floor)
}

/// Verdict of the last check of a target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Up,
    Down,
    Degraded,
    #[default]
    Unknown,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Up => "up",
            TargetStatus::Down => "down",
            TargetStatus::Degraded => "degraded",
            TargetStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monitoring configuration and last known state of one URL.
///
/// Stored as JSON under [`target_key`]. The wire form keeps the sentinel
/// encoding older records were written with (see [`TargetWire`]), while the
/// in-memory form uses `Option` for every value that may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TargetWire", from = "TargetWire")]
pub struct Target {
    /// Monitored URL, the identity of the record
    pub url: String,

    /// Check interval in seconds
    pub frequency: u64,

    /// Creation time, epoch seconds
    pub created_at: i64,

    /// Last probe time, epoch seconds. `None` until the first probe.
    pub last_checked_at: Option<i64>,

    pub status: TargetStatus,

    /// Latency of the last probe in milliseconds
    pub response_time_ms: Option<u64>,

    /// HTTP status of the last probe, `None` if no response was received
    pub status_code: Option<u16>,

    /// Transport error of the last probe
    pub error: Option<String>,
}

impl Target {
    /// A never-checked record for `url`.
    pub fn new(url: impl Into<String>, frequency: u64, created_at: i64) -> Self {
        Self {
            url: url.into(),
            frequency,
            created_at,
            last_checked_at: None,
            status: TargetStatus::Unknown,
            response_time_ms: None,
            status_code: None,
            error: None,
        }
    }

    pub fn key(&self) -> String {
        target_key(&self.url)
    }

    /// Overwrite the check fields with the outcome of one probe.
    ///
    /// `status` is always derived from the error text and status code here and
    /// never set on its own.
    pub fn record_probe(&mut self, result: &ProbeResult, checked_at: i64) {
        self.last_checked_at = Some(checked_at);
        self.response_time_ms = result.elapsed_ms;
        self.status_code = result.status_code;
        self.error = result.error.clone().filter(|e| !e.is_empty());
        self.status = classify(self.error.as_deref().unwrap_or_default(), self.status_code.unwrap_or(0));
    }
}

/// Serialized shape of a [`Target`].
///
/// `lastCheckedAt` is omitted (read back as 0) until the first check,
/// `responseTime` is -1 when unknown, `statusCode` is -1 before the first
/// check and 0 when a check got no HTTP response, `error` is omitted when
/// empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetWire {
    url: String,
    frequency: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    last_checked_at: i64,
    created_at: i64,
    #[serde(default)]
    status: TargetStatus,
    #[serde(default)]
    response_time: i64,
    #[serde(default = "absent")]
    status_code: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    error: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn absent() -> i64 {
    -1
}

impl From<Target> for TargetWire {
    fn from(target: Target) -> Self {
        let status_code = match (target.status_code, target.last_checked_at) {
            (Some(code), _) => i64::from(code),
            (None, Some(_)) => 0,
            (None, None) => -1,
        };

        Self {
            url: target.url,
            frequency: target.frequency,
            last_checked_at: target.last_checked_at.unwrap_or(0),
            created_at: target.created_at,
            status: target.status,
            response_time: target.response_time_ms.map_or(-1, |ms| ms as i64),
            status_code,
            error: target.error.unwrap_or_default(),
        }
    }
}

impl From<TargetWire> for Target {
    fn from(wire: TargetWire) -> Self {
        Self {
            url: wire.url,
            frequency: wire.frequency,
            created_at: wire.created_at,
            last_checked_at: (wire.last_checked_at > 0).then_some(wire.last_checked_at),
            status: wire.status,
            response_time_ms: u64::try_from(wire.response_time).ok(),
            status_code: u16::try_from(wire.status_code).ok().filter(|code| *code > 0),
            error: Some(wire.error).filter(|e| !e.is_empty()),
        }
    }
}
