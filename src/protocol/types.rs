use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// One fault as sent to the fault service. Only the fields relevant to
/// `fault_type` are ever populated; the rest are skipped on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultPayload {
    pub fault_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth_rate_kbit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth_burst_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth_latency_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_node1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_node2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_dummy_dest_ip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_duration_sec: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_ping_target_ip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_ping_count: Option<u32>,
}

/// Per-item (and overall) status reported by the fault service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
    Warning,
    Info,
    /// No result came back for the entry, or the status string was not
    /// recognised.
    #[serde(other)]
    Unknown,
}

impl ResultStatus {
    pub fn is_success(self) -> bool {
        matches!(self, ResultStatus::Success)
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultStatus::Success => "success",
            ResultStatus::Error => "error",
            ResultStatus::Warning => "warning",
            ResultStatus::Info => "info",
            ResultStatus::Unknown => "unknown",
        };
        f.pad(s)
    }
}

/// One entry of `details`, aligned by position with the submitted array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDetail {
    #[serde(default)]
    pub fault_type: String,
    #[serde(default = "unknown_status")]
    pub status: ResultStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub target_display: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default = "unknown_status")]
    pub status: ResultStatus,
    #[serde(default)]
    pub details: Vec<ResultDetail>,
}

fn unknown_status() -> ResultStatus {
    ResultStatus::Unknown
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultFlagRequest {
    pub is_injected: bool,
}

/// Generic `{status, message}` body used by the lab for errors and acks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
