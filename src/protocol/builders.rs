use crate::entry::{FaultEntry, FaultSpec};
use crate::kind::Field;

use super::types::FaultPayload;

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Build the wire payload for one entry.
///
/// The kind's relevance table decides what is written; a selector that is
/// populated but irrelevant for the kind is never sent.
pub fn build_payload(entry: &FaultEntry) -> FaultPayload {
    let kind = entry.kind();
    let relevant = kind.relevant_fields();
    let mut payload = FaultPayload {
        fault_type: kind.as_str().to_string(),
        ..Default::default()
    };

    if relevant.contains(Field::TargetNode) {
        payload.target_node = non_empty(&entry.target.node);
    }
    if relevant.contains(Field::TargetInterface) {
        payload.target_interface = non_empty(&entry.target.interface);
    }
    if relevant.contains(Field::TargetLink) {
        payload.target_link = non_empty(&entry.target.link);
    }

    match &entry.spec {
        FaultSpec::AddLatency(p) => {
            payload.latency_ms = p.latency_ms;
            payload.jitter_ms = p.jitter_ms;
            payload.correlation_percent = p.correlation_percent;
        }
        FaultSpec::LimitBandwidth(p) => {
            payload.bandwidth_rate_kbit = p.rate_kbit;
            payload.bandwidth_burst_bytes = p.burst_bytes;
            payload.bandwidth_latency_ms = p.latency_ms;
        }
        FaultSpec::RoutingLoopTimed(p) => {
            payload.loop_node1 = non_empty(&p.node1);
            payload.loop_node2 = non_empty(&p.node2);
            payload.loop_dummy_dest_ip = p.dummy_dest_ip;
            payload.loop_duration_sec = p.duration_sec;
            payload.loop_ping_target_ip = p.ping_target_ip;
            payload.loop_ping_count = p.ping_count;
        }
        FaultSpec::LinkDown
        | FaultSpec::LinkUp
        | FaultSpec::NodeStop
        | FaultSpec::NodeStart
        | FaultSpec::NodePause
        | FaultSpec::NodeUnpause
        | FaultSpec::TcClear => {}
    }

    payload
}

/// Payloads for `entries`, in order.
pub fn build_batch<'a>(entries: impl IntoIterator<Item = &'a FaultEntry>) -> Vec<FaultPayload> {
    entries.into_iter().map(build_payload).collect()
}
