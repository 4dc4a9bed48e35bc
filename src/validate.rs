//! Local validation run before a batch may leave the console.

use smallvec::SmallVec;

use crate::entry::{FaultEntry, FaultSpec};
use crate::error::EntryIssue;
use crate::kind::Field;

pub type Issues = SmallVec<[EntryIssue; 4]>;

/// Problems with one entry, in field order. Only fields relevant to the
/// entry's kind are checked.
pub fn validate_entry(entry: &FaultEntry) -> Issues {
    let mut issues = Issues::new();
    let mut push = |field: Field, reason: &str| {
        issues.push(EntryIssue {
            entry: entry.id,
            field,
            reason: reason.to_string(),
        })
    };

    for field in entry.kind().required_fields().iter() {
        if entry.value_text(field).is_empty() {
            push(field, "required");
        }
    }

    match &entry.spec {
        FaultSpec::AddLatency(p) => {
            if p.latency_ms == Some(0) {
                push(Field::LatencyMs, "must be positive");
            }
            if p.correlation_percent.is_some_and(|c| c > 100) {
                push(Field::CorrelationPercent, "must be within 0-100");
            }
        }
        FaultSpec::LimitBandwidth(p) => {
            if p.rate_kbit == Some(0) {
                push(Field::BandwidthRateKbit, "must be positive");
            }
            if p.burst_bytes == Some(0) {
                push(Field::BandwidthBurstBytes, "must be positive");
            }
        }
        FaultSpec::RoutingLoopTimed(p) => {
            if !p.node1.is_empty() && p.node1 == p.node2 {
                push(Field::LoopNode2, "must differ from loop_node1");
            }
            if p.duration_sec == Some(0) {
                push(Field::LoopDurationSec, "must be positive");
            }
            if p.ping_count == Some(0) {
                push(Field::LoopPingCount, "must be positive when set");
            }
        }
        _ => {}
    }

    issues
}

/// Issues across a whole batch, in entry order.
pub fn validate_batch(entries: &[FaultEntry]) -> Vec<EntryIssue> {
    entries.iter().flat_map(validate_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryId, FieldUpdate};
    use crate::kind::FaultKind;

    fn entry(kind: FaultKind) -> FaultEntry {
        let mut e = FaultEntry::new(EntryId(9));
        e.set_kind(kind);
        e
    }

    fn fields(issues: &Issues) -> Vec<Field> {
        issues.iter().map(|i| i.field).collect()
    }

    #[test]
    fn test_link_requires_link_and_interface() {
        let mut e = entry(FaultKind::LinkUp);
        assert_eq!(
            fields(&validate_entry(&e)),
            [Field::TargetInterface, Field::TargetLink]
        );
        e.target.interface = "eth1".into();
        e.target.link = "r1|r2".into();
        // Node is optional for link kinds: the service falls back to the
        // link's first endpoint.
        assert!(validate_entry(&e).is_empty());
    }

    #[test]
    fn test_latency_positive() {
        let mut e = entry(FaultKind::AddLatency);
        e.target.node = "r1".into();
        e.target.interface = "eth1".into();
        assert!(validate_entry(&e).is_empty());

        e.apply(FieldUpdate::LatencyMs(Some(0))).unwrap();
        assert_eq!(fields(&validate_entry(&e)), [Field::LatencyMs]);

        e.apply(FieldUpdate::LatencyMs(None)).unwrap();
        let issues = validate_entry(&e);
        assert_eq!(issues[0].reason, "required");
    }

    #[test]
    fn test_loop_rules() {
        let mut e = entry(FaultKind::RoutingLoopTimed);
        e.apply(FieldUpdate::LoopNode1("r1".into())).unwrap();
        e.apply(FieldUpdate::LoopNode2("r1".into())).unwrap();
        e.apply(FieldUpdate::LoopPingCount(Some(0))).unwrap();
        assert_eq!(
            fields(&validate_entry(&e)),
            [Field::LoopDummyDestIp, Field::LoopNode2, Field::LoopPingCount]
        );
    }

    #[test]
    fn test_validate_batch_order() {
        let ok = {
            let mut e = entry(FaultKind::NodeStop);
            e.target.node = "r1".into();
            e
        };
        let bad = entry(FaultKind::TcClear);
        let issues = validate_batch(&[ok, bad]);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.entry == EntryId(9)));
    }
}
