use crate::error::{DiscoveryError, SubmitError};
use crate::topology::TopologySnapshot;

use super::types::{StatusBody, SubmitResponse};

/// Parse a topology discovery body.
///
/// Empty node/link lists are a valid (empty) topology. Anything that is not
/// JSON of the expected shape is a [`DiscoveryError::Malformed`].
pub fn parse_topology(body: &[u8]) -> Result<TopologySnapshot, DiscoveryError> {
    let topology: TopologySnapshot =
        serde_json::from_slice(body).map_err(|e| DiscoveryError::Malformed(e.to_string()))?;

    if let Some(bad) = topology.nodes.iter().find(|n| n.is_empty()) {
        return Err(DiscoveryError::Malformed(format!(
            "node name {bad:?} is empty"
        )));
    }
    Ok(topology)
}

/// Parse a batch response. Per-item alignment is handled by the submitter.
pub fn parse_submit_response(body: &[u8]) -> Result<SubmitResponse, SubmitError> {
    serde_json::from_slice(body).map_err(|e| SubmitError::Malformed(e.to_string()))
}

/// Best-effort human message from an error body: the JSON `message` if
/// there is one, otherwise the trimmed text.
pub fn error_message(body: &[u8]) -> String {
    if let Ok(StatusBody {
        message: Some(message),
        ..
    }) = serde_json::from_slice::<StatusBody>(body)
    {
        return message;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "(empty response body)".to_string()
    } else {
        text.to_string()
    }
}
