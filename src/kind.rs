//! Fault kinds and the field relevance table.
//!
//! [`FaultKind::relevant_fields`] is the one place that decides which fields
//! of an entry are shown, resolved, validated and serialized for a kind.

use std::fmt;

use serde::Serialize;

/// Kind of fault a batch entry requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Bring one interface of a link endpoint down.
    #[default]
    LinkDown,
    /// Bring one interface of a link endpoint back up.
    LinkUp,
    NodeStop,
    NodeStart,
    NodePause,
    NodeUnpause,
    /// netem delay on a node interface.
    AddLatency,
    /// tbf rate limit on a node interface.
    LimitBandwidth,
    /// Remove the root qdisc from a node interface.
    TcClear,
    /// Install a routing loop between two nodes for a fixed duration.
    RoutingLoopTimed,
}

impl FaultKind {
    pub const ALL: [FaultKind; 10] = [
        FaultKind::LinkDown,
        FaultKind::LinkUp,
        FaultKind::NodeStop,
        FaultKind::NodeStart,
        FaultKind::NodePause,
        FaultKind::NodeUnpause,
        FaultKind::AddLatency,
        FaultKind::LimitBandwidth,
        FaultKind::TcClear,
        FaultKind::RoutingLoopTimed,
    ];

    /// Wire name, as sent in `fault_type`.
    pub const fn as_str(self) -> &'static str {
        match self {
            FaultKind::LinkDown => "link_down",
            FaultKind::LinkUp => "link_up",
            FaultKind::NodeStop => "node_stop",
            FaultKind::NodeStart => "node_start",
            FaultKind::NodePause => "node_pause",
            FaultKind::NodeUnpause => "node_unpause",
            FaultKind::AddLatency => "add_latency",
            FaultKind::LimitBandwidth => "limit_bandwidth",
            FaultKind::TcClear => "tc_clear",
            FaultKind::RoutingLoopTimed => "routing_loop_timed",
        }
    }

    pub const fn is_link_op(self) -> bool {
        matches!(self, FaultKind::LinkDown | FaultKind::LinkUp)
    }

    pub const fn is_routing_loop(self) -> bool {
        matches!(self, FaultKind::RoutingLoopTimed)
    }

    /// Fields shown for this kind. Everything else is hidden, cleared and
    /// never serialized.
    pub const fn relevant_fields(self) -> FieldSet {
        use Field::*;
        match self {
            FaultKind::LinkDown | FaultKind::LinkUp => {
                FieldSet::of(&[Kind, TargetNode, TargetInterface, TargetLink])
            }
            FaultKind::NodeStop
            | FaultKind::NodeStart
            | FaultKind::NodePause
            | FaultKind::NodeUnpause => FieldSet::of(&[Kind, TargetNode]),
            FaultKind::AddLatency => FieldSet::of(&[
                Kind,
                TargetNode,
                TargetInterface,
                LatencyMs,
                JitterMs,
                CorrelationPercent,
            ]),
            FaultKind::LimitBandwidth => FieldSet::of(&[
                Kind,
                TargetNode,
                TargetInterface,
                BandwidthRateKbit,
                BandwidthBurstBytes,
                BandwidthLatencyMs,
            ]),
            FaultKind::TcClear => FieldSet::of(&[Kind, TargetNode, TargetInterface]),
            FaultKind::RoutingLoopTimed => FieldSet::of(&[
                Kind,
                LoopNode1,
                LoopNode2,
                LoopDummyDestIp,
                LoopDurationSec,
                LoopPingTargetIp,
                LoopPingCount,
            ]),
        }
    }

    /// Subset of [`relevant_fields`](Self::relevant_fields) that must hold a
    /// value before the entry can be submitted.
    pub const fn required_fields(self) -> FieldSet {
        use Field::*;
        match self {
            FaultKind::LinkDown | FaultKind::LinkUp => {
                FieldSet::of(&[TargetInterface, TargetLink])
            }
            FaultKind::NodeStop
            | FaultKind::NodeStart
            | FaultKind::NodePause
            | FaultKind::NodeUnpause => FieldSet::of(&[TargetNode]),
            FaultKind::AddLatency => FieldSet::of(&[TargetNode, TargetInterface, LatencyMs]),
            FaultKind::LimitBandwidth => {
                FieldSet::of(&[TargetNode, TargetInterface, BandwidthRateKbit])
            }
            FaultKind::TcClear => FieldSet::of(&[TargetNode, TargetInterface]),
            FaultKind::RoutingLoopTimed => FieldSet::of(&[
                LoopNode1,
                LoopNode2,
                LoopDummyDestIp,
                LoopDurationSec,
            ]),
        }
    }

    pub fn is_relevant(self, field: Field) -> bool {
        self.relevant_fields().contains(field)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for FaultKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        FaultKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown fault kind '{}': use one of {}",
                    s,
                    FaultKind::ALL.map(FaultKind::as_str).join(", ")
                )
            })
    }
}

/// Every editable field of a fault entry, named after its wire key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Field {
    Kind,
    TargetNode,
    TargetInterface,
    TargetLink,
    LatencyMs,
    JitterMs,
    CorrelationPercent,
    BandwidthRateKbit,
    BandwidthBurstBytes,
    BandwidthLatencyMs,
    LoopNode1,
    LoopNode2,
    LoopDummyDestIp,
    LoopDurationSec,
    LoopPingTargetIp,
    LoopPingCount,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::Kind,
        Field::TargetNode,
        Field::TargetInterface,
        Field::TargetLink,
        Field::LatencyMs,
        Field::JitterMs,
        Field::CorrelationPercent,
        Field::BandwidthRateKbit,
        Field::BandwidthBurstBytes,
        Field::BandwidthLatencyMs,
        Field::LoopNode1,
        Field::LoopNode2,
        Field::LoopDummyDestIp,
        Field::LoopDurationSec,
        Field::LoopPingTargetIp,
        Field::LoopPingCount,
    ];

    pub const fn wire_name(self) -> &'static str {
        match self {
            Field::Kind => "fault_type",
            Field::TargetNode => "target_node",
            Field::TargetInterface => "target_interface",
            Field::TargetLink => "target_link",
            Field::LatencyMs => "latency_ms",
            Field::JitterMs => "jitter_ms",
            Field::CorrelationPercent => "correlation_percent",
            Field::BandwidthRateKbit => "bandwidth_rate_kbit",
            Field::BandwidthBurstBytes => "bandwidth_burst_bytes",
            Field::BandwidthLatencyMs => "bandwidth_latency_ms",
            Field::LoopNode1 => "loop_node1",
            Field::LoopNode2 => "loop_node2",
            Field::LoopDummyDestIp => "loop_dummy_dest_ip",
            Field::LoopDurationSec => "loop_duration_sec",
            Field::LoopPingTargetIp => "loop_ping_target_ip",
            Field::LoopPingCount => "loop_ping_count",
        }
    }

    const fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    /// Accepts the wire name (`target_node`), a dashed variant
    /// (`target-node`) or camelCase (`targetNode`). `kind` aliases
    /// `fault_type`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let flat: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if flat == "kind" {
            return Ok(Field::Kind);
        }
        Field::ALL
            .into_iter()
            .find(|field| field.wire_name().replace('_', "") == flat)
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

/// Small bitset of [`Field`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldSet(u32);

impl FieldSet {
    pub const EMPTY: FieldSet = FieldSet(0);

    pub const fn of(fields: &[Field]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < fields.len() {
            bits |= fields[i].bit();
            i += 1;
        }
        FieldSet(bits)
    }

    pub const fn contains(self, field: Field) -> bool {
        self.0 & field.bit() != 0
    }

    pub const fn union(self, other: FieldSet) -> FieldSet {
        FieldSet(self.0 | other.0)
    }

    pub const fn difference(self, other: FieldSet) -> FieldSet {
        FieldSet(self.0 & !other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Fields in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Field> {
        Field::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}
