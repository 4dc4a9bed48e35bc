//! JSON wire formats of the lab services.

mod builders;
mod constants;
mod parsers;
mod types;

pub use builders::{build_batch, build_payload};
pub use constants::*;
pub use parsers::{error_message, parse_submit_response, parse_topology};
pub use types::{
    FaultFlagRequest, FaultPayload, ResultDetail, ResultStatus, StatusBody, SubmitResponse,
};

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::entry::{EntryId, FaultEntry, FaultSpec, FieldUpdate, LoopParams};
    use crate::error::DiscoveryError;
    use crate::kind::FaultKind;

    fn entry(kind: FaultKind) -> FaultEntry {
        let mut e = FaultEntry::new(EntryId(1));
        e.set_kind(kind);
        e
    }

    #[test]
    fn test_link_payload_fields() {
        let mut e = entry(FaultKind::LinkDown);
        e.target.node = "r1".into();
        e.target.interface = "eth1".into();
        e.target.link = "r1|r2".into();

        let value = serde_json::to_value(build_payload(&e)).unwrap();
        assert_eq!(
            value,
            json!({
                "fault_type": "link_down",
                "target_node": "r1",
                "target_interface": "eth1",
                "target_link": "r1|r2",
            })
        );
    }

    #[test]
    fn test_irrelevant_selectors_not_serialized() {
        let mut e = entry(FaultKind::NodeStop);
        e.target.node = "r2".into();
        // Stale values left behind by hand must still never reach the wire.
        e.target.interface = "eth1".into();
        e.target.link = "r1|r2".into();

        let value = serde_json::to_value(build_payload(&e)).unwrap();
        assert_eq!(value, json!({"fault_type": "node_stop", "target_node": "r2"}));
    }

    #[test]
    fn test_latency_payload_skips_unset_optionals() {
        let mut e = entry(FaultKind::AddLatency);
        e.target.node = "r1".into();
        e.target.interface = "eth1".into();
        e.apply(FieldUpdate::JitterMs(Some(5))).unwrap();

        let value = serde_json::to_value(build_payload(&e)).unwrap();
        assert_eq!(
            value,
            json!({
                "fault_type": "add_latency",
                "target_node": "r1",
                "target_interface": "eth1",
                "latency_ms": DEFAULT_LATENCY_MS,
                "jitter_ms": 5,
            })
        );
    }

    #[test]
    fn test_loop_payload() {
        let mut e = entry(FaultKind::RoutingLoopTimed);
        e.spec = FaultSpec::RoutingLoopTimed(LoopParams {
            node1: "r1".into(),
            node2: "r2".into(),
            dummy_dest_ip: Some("2001:db8:99::1".parse().unwrap()),
            duration_sec: Some(30),
            ping_target_ip: None,
            ping_count: Some(3),
        });

        let value = serde_json::to_value(build_payload(&e)).unwrap();
        assert_eq!(
            value,
            json!({
                "fault_type": "routing_loop_timed",
                "loop_node1": "r1",
                "loop_node2": "r2",
                "loop_dummy_dest_ip": "2001:db8:99::1",
                "loop_duration_sec": 30,
                "loop_ping_count": 3,
            })
        );
    }

    #[test]
    fn test_build_batch_keeps_order() {
        let a = entry(FaultKind::NodeStart);
        let b = entry(FaultKind::TcClear);
        let batch = build_batch([&a, &b]);
        let kinds: Vec<_> = batch.iter().map(|p| p.fault_type.as_str()).collect();
        assert_eq!(kinds, ["node_start", "tc_clear"]);
    }

    #[test]
    fn test_parse_topology_empty_is_valid() {
        let topo = parse_topology(br#"{"nodes": [], "links": [], "interfacesByNode": {}}"#).unwrap();
        assert!(topo.is_empty());
        let topo = parse_topology(br#"{"nodes": []}"#).unwrap();
        assert!(topo.links.is_empty());
    }

    #[test]
    fn test_parse_topology_malformed() {
        assert!(matches!(
            parse_topology(b"<html>502</html>"),
            Err(DiscoveryError::Malformed(_))
        ));
        assert!(matches!(
            parse_topology(br#"{"nodes": ["r1"], "links": [["r1"]]}"#),
            Err(DiscoveryError::Malformed(_))
        ));
        assert!(matches!(
            parse_topology(br#"{"links": []}"#),
            Err(DiscoveryError::Malformed(_))
        ));
        assert!(matches!(
            parse_topology(br#"{"nodes": ["r1", ""]}"#),
            Err(DiscoveryError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_submit_response_unknown_status() {
        let resp = parse_submit_response(
            br#"{"message": "done", "status": "partial",
                 "details": [{"fault_type": "tc_clear", "status": "weird"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.status, ResultStatus::Unknown);
        assert_eq!(resp.details[0].status, ResultStatus::Unknown);
        assert_eq!(resp.details[0].message, "");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(br#"{"status": "error", "message": "docker not running"}"#),
            "docker not running"
        );
        assert_eq!(error_message(b"  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(b""), "(empty response body)");
    }
}
