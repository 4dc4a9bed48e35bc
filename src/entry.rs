//! Fault entries: one configured, not-yet-executed fault per batch row.

use std::fmt;
use std::net::IpAddr;

use serde::Serialize;

use crate::kind::{FaultKind, Field};
use crate::protocol::{DEFAULT_BANDWIDTH_RATE_KBIT, DEFAULT_LATENCY_MS, DEFAULT_LOOP_DURATION_SEC};

/// Opaque entry identifier. Allocated by [`FaultConfigSet`](crate::FaultConfigSet),
/// never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub(crate) u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl std::str::FromStr for EntryId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        digits
            .parse::<u64>()
            .map(EntryId)
            .map_err(|_| format!("invalid entry id '{s}'"))
    }
}

/// Topology-scoped selectors. The empty string is the "nothing selected"
/// sentinel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Targets {
    pub node: String,
    pub interface: String,
    /// Canonical `a|b` link key.
    pub link: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatencyParams {
    pub latency_ms: Option<u32>,
    pub jitter_ms: Option<u32>,
    pub correlation_percent: Option<u8>,
}

impl Default for LatencyParams {
    fn default() -> Self {
        Self {
            latency_ms: Some(DEFAULT_LATENCY_MS),
            jitter_ms: None,
            correlation_percent: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BandwidthParams {
    pub rate_kbit: Option<u64>,
    pub burst_bytes: Option<u64>,
    pub latency_ms: Option<u32>,
}

impl Default for BandwidthParams {
    fn default() -> Self {
        Self {
            rate_kbit: Some(DEFAULT_BANDWIDTH_RATE_KBIT),
            burst_bytes: None,
            latency_ms: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopParams {
    pub node1: String,
    pub node2: String,
    pub dummy_dest_ip: Option<IpAddr>,
    pub duration_sec: Option<u32>,
    pub ping_target_ip: Option<IpAddr>,
    pub ping_count: Option<u32>,
}

impl Default for LoopParams {
    fn default() -> Self {
        Self {
            node1: String::new(),
            node2: String::new(),
            dummy_dest_ip: None,
            duration_sec: Some(DEFAULT_LOOP_DURATION_SEC),
            ping_target_ip: None,
            ping_count: None,
        }
    }
}

/// Kind plus the parameters only that kind carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultSpec {
    LinkDown,
    LinkUp,
    NodeStop,
    NodeStart,
    NodePause,
    NodeUnpause,
    AddLatency(LatencyParams),
    LimitBandwidth(BandwidthParams),
    TcClear,
    RoutingLoopTimed(LoopParams),
}

impl Default for FaultSpec {
    fn default() -> Self {
        FaultSpec::for_kind(FaultKind::default())
    }
}

impl FaultSpec {
    /// Fresh spec for `kind` with every parameter at its default.
    pub fn for_kind(kind: FaultKind) -> Self {
        match kind {
            FaultKind::LinkDown => FaultSpec::LinkDown,
            FaultKind::LinkUp => FaultSpec::LinkUp,
            FaultKind::NodeStop => FaultSpec::NodeStop,
            FaultKind::NodeStart => FaultSpec::NodeStart,
            FaultKind::NodePause => FaultSpec::NodePause,
            FaultKind::NodeUnpause => FaultSpec::NodeUnpause,
            FaultKind::AddLatency => FaultSpec::AddLatency(LatencyParams::default()),
            FaultKind::LimitBandwidth => FaultSpec::LimitBandwidth(BandwidthParams::default()),
            FaultKind::TcClear => FaultSpec::TcClear,
            FaultKind::RoutingLoopTimed => FaultSpec::RoutingLoopTimed(LoopParams::default()),
        }
    }

    pub fn kind(&self) -> FaultKind {
        match self {
            FaultSpec::LinkDown => FaultKind::LinkDown,
            FaultSpec::LinkUp => FaultKind::LinkUp,
            FaultSpec::NodeStop => FaultKind::NodeStop,
            FaultSpec::NodeStart => FaultKind::NodeStart,
            FaultSpec::NodePause => FaultKind::NodePause,
            FaultSpec::NodeUnpause => FaultKind::NodeUnpause,
            FaultSpec::AddLatency(_) => FaultKind::AddLatency,
            FaultSpec::LimitBandwidth(_) => FaultKind::LimitBandwidth,
            FaultSpec::TcClear => FaultKind::TcClear,
            FaultSpec::RoutingLoopTimed(_) => FaultKind::RoutingLoopTimed,
        }
    }
}

/// A typed edit to one field. `None` clears an optional parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldUpdate {
    Kind(FaultKind),
    TargetNode(String),
    TargetInterface(String),
    TargetLink(String),
    LatencyMs(Option<u32>),
    JitterMs(Option<u32>),
    CorrelationPercent(Option<u8>),
    BandwidthRateKbit(Option<u64>),
    BandwidthBurstBytes(Option<u64>),
    BandwidthLatencyMs(Option<u32>),
    LoopNode1(String),
    LoopNode2(String),
    LoopDummyDestIp(Option<IpAddr>),
    LoopDurationSec(Option<u32>),
    LoopPingTargetIp(Option<IpAddr>),
    LoopPingCount(Option<u32>),
}

impl FieldUpdate {
    pub fn field(&self) -> Field {
        match self {
            FieldUpdate::Kind(_) => Field::Kind,
            FieldUpdate::TargetNode(_) => Field::TargetNode,
            FieldUpdate::TargetInterface(_) => Field::TargetInterface,
            FieldUpdate::TargetLink(_) => Field::TargetLink,
            FieldUpdate::LatencyMs(_) => Field::LatencyMs,
            FieldUpdate::JitterMs(_) => Field::JitterMs,
            FieldUpdate::CorrelationPercent(_) => Field::CorrelationPercent,
            FieldUpdate::BandwidthRateKbit(_) => Field::BandwidthRateKbit,
            FieldUpdate::BandwidthBurstBytes(_) => Field::BandwidthBurstBytes,
            FieldUpdate::BandwidthLatencyMs(_) => Field::BandwidthLatencyMs,
            FieldUpdate::LoopNode1(_) => Field::LoopNode1,
            FieldUpdate::LoopNode2(_) => Field::LoopNode2,
            FieldUpdate::LoopDummyDestIp(_) => Field::LoopDummyDestIp,
            FieldUpdate::LoopDurationSec(_) => Field::LoopDurationSec,
            FieldUpdate::LoopPingTargetIp(_) => Field::LoopPingTargetIp,
            FieldUpdate::LoopPingCount(_) => Field::LoopPingCount,
        }
    }

    /// Parse operator text for `field`. Empty text clears optional values
    /// and selectors.
    pub fn parse(field: Field, text: &str) -> Result<Self, String> {
        let text = text.trim();
        let update = match field {
            Field::Kind => FieldUpdate::Kind(text.parse()?),
            Field::TargetNode => FieldUpdate::TargetNode(text.to_string()),
            Field::TargetInterface => FieldUpdate::TargetInterface(text.to_string()),
            Field::TargetLink => FieldUpdate::TargetLink(text.to_string()),
            Field::LatencyMs => FieldUpdate::LatencyMs(parse_opt(text)?),
            Field::JitterMs => FieldUpdate::JitterMs(parse_opt(text)?),
            Field::CorrelationPercent => {
                let value = parse_opt::<u8>(text)?;
                if value.is_some_and(|v| v > 100) {
                    return Err(format!("'{text}' is not a percentage (0-100)"));
                }
                FieldUpdate::CorrelationPercent(value)
            }
            Field::BandwidthRateKbit => FieldUpdate::BandwidthRateKbit(parse_opt(text)?),
            Field::BandwidthBurstBytes => FieldUpdate::BandwidthBurstBytes(parse_opt(text)?),
            Field::BandwidthLatencyMs => FieldUpdate::BandwidthLatencyMs(parse_opt(text)?),
            Field::LoopNode1 => FieldUpdate::LoopNode1(text.to_string()),
            Field::LoopNode2 => FieldUpdate::LoopNode2(text.to_string()),
            Field::LoopDummyDestIp => FieldUpdate::LoopDummyDestIp(parse_opt(text)?),
            Field::LoopDurationSec => FieldUpdate::LoopDurationSec(parse_opt(text)?),
            Field::LoopPingTargetIp => FieldUpdate::LoopPingTargetIp(parse_opt(text)?),
            Field::LoopPingCount => FieldUpdate::LoopPingCount(parse_opt(text)?),
        };
        Ok(update)
    }
}

fn parse_opt<T>(text: &str) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<T>()
        .map(Some)
        .map_err(|e| format!("'{text}': {e}"))
}

/// One row of the batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultEntry {
    pub id: EntryId,
    pub target: Targets,
    pub spec: FaultSpec,
}

impl FaultEntry {
    pub(crate) fn new(id: EntryId) -> Self {
        Self {
            id,
            target: Targets::default(),
            spec: FaultSpec::default(),
        }
    }

    pub fn kind(&self) -> FaultKind {
        self.spec.kind()
    }

    pub fn latency(&self) -> Option<&LatencyParams> {
        match &self.spec {
            FaultSpec::AddLatency(p) => Some(p),
            _ => None,
        }
    }

    pub fn bandwidth(&self) -> Option<&BandwidthParams> {
        match &self.spec {
            FaultSpec::LimitBandwidth(p) => Some(p),
            _ => None,
        }
    }

    pub fn routing_loop(&self) -> Option<&LoopParams> {
        match &self.spec {
            FaultSpec::RoutingLoopTimed(p) => Some(p),
            _ => None,
        }
    }

    /// Switch kind. Parameters of the old kind are dropped and the new kind's
    /// parameters start at their defaults; selectors are left for the
    /// resolver to clear or fill.
    pub(crate) fn set_kind(&mut self, kind: FaultKind) {
        if self.kind() != kind {
            self.spec = FaultSpec::for_kind(kind);
        }
    }

    /// Apply a non-kind edit. Fails when the field is not relevant for the
    /// entry's kind.
    pub(crate) fn apply(&mut self, update: FieldUpdate) -> Result<(), Field> {
        let field = update.field();
        if !self.kind().is_relevant(field) {
            return Err(field);
        }
        if let FieldUpdate::Kind(kind) = update {
            self.set_kind(kind);
            return Ok(());
        }
        match (update, &mut self.spec) {
            (FieldUpdate::TargetNode(v), _) => self.target.node = v,
            (FieldUpdate::TargetInterface(v), _) => self.target.interface = v,
            (FieldUpdate::TargetLink(v), _) => self.target.link = v,
            (FieldUpdate::LatencyMs(v), FaultSpec::AddLatency(p)) => p.latency_ms = v,
            (FieldUpdate::JitterMs(v), FaultSpec::AddLatency(p)) => p.jitter_ms = v,
            (FieldUpdate::CorrelationPercent(v), FaultSpec::AddLatency(p)) => {
                p.correlation_percent = v
            }
            (FieldUpdate::BandwidthRateKbit(v), FaultSpec::LimitBandwidth(p)) => p.rate_kbit = v,
            (FieldUpdate::BandwidthBurstBytes(v), FaultSpec::LimitBandwidth(p)) => {
                p.burst_bytes = v
            }
            (FieldUpdate::BandwidthLatencyMs(v), FaultSpec::LimitBandwidth(p)) => {
                p.latency_ms = v
            }
            (FieldUpdate::LoopNode1(v), FaultSpec::RoutingLoopTimed(p)) => p.node1 = v,
            (FieldUpdate::LoopNode2(v), FaultSpec::RoutingLoopTimed(p)) => p.node2 = v,
            (FieldUpdate::LoopDummyDestIp(v), FaultSpec::RoutingLoopTimed(p)) => {
                p.dummy_dest_ip = v
            }
            (FieldUpdate::LoopDurationSec(v), FaultSpec::RoutingLoopTimed(p)) => {
                p.duration_sec = v
            }
            (FieldUpdate::LoopPingTargetIp(v), FaultSpec::RoutingLoopTimed(p)) => {
                p.ping_target_ip = v
            }
            (FieldUpdate::LoopPingCount(v), FaultSpec::RoutingLoopTimed(p)) => p.ping_count = v,
            _ => return Err(field),
        }
        Ok(())
    }

    /// Current value of `field` as display text; empty when unset or
    /// irrelevant.
    pub fn value_text(&self, field: Field) -> String {
        fn opt<T: ToString>(v: Option<T>) -> String {
            v.map(|v| v.to_string()).unwrap_or_default()
        }
        if !self.kind().is_relevant(field) {
            return String::new();
        }
        match field {
            Field::Kind => self.kind().to_string(),
            Field::TargetNode => self.target.node.clone(),
            Field::TargetInterface => self.target.interface.clone(),
            Field::TargetLink => self.target.link.clone(),
            Field::LatencyMs => opt(self.latency().and_then(|p| p.latency_ms)),
            Field::JitterMs => opt(self.latency().and_then(|p| p.jitter_ms)),
            Field::CorrelationPercent => opt(self.latency().and_then(|p| p.correlation_percent)),
            Field::BandwidthRateKbit => opt(self.bandwidth().and_then(|p| p.rate_kbit)),
            Field::BandwidthBurstBytes => opt(self.bandwidth().and_then(|p| p.burst_bytes)),
            Field::BandwidthLatencyMs => opt(self.bandwidth().and_then(|p| p.latency_ms)),
            Field::LoopNode1 => self
                .routing_loop()
                .map(|p| p.node1.clone())
                .unwrap_or_default(),
            Field::LoopNode2 => self
                .routing_loop()
                .map(|p| p.node2.clone())
                .unwrap_or_default(),
            Field::LoopDummyDestIp => opt(self.routing_loop().and_then(|p| p.dummy_dest_ip)),
            Field::LoopDurationSec => opt(self.routing_loop().and_then(|p| p.duration_sec)),
            Field::LoopPingTargetIp => opt(self.routing_loop().and_then(|p| p.ping_target_ip)),
            Field::LoopPingCount => opt(self.routing_loop().and_then(|p| p.ping_count)),
        }
    }
}
