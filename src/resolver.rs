//! Cascade resolution of topology-dependent fields.
//!
//! Every mutation path (kind change, node or link edit, topology refresh,
//! entry creation) funnels through [`resolve`]. A field that is still valid
//! under the topology is kept; only missing or stale references are replaced,
//! and "first" always means first in discovery order.

use tracing::trace;

use crate::entry::{FaultEntry, FaultSpec};
use crate::kind::{FaultKind, Field};
use crate::topology::TopologySnapshot;

/// Produce a corrected copy of `entry` for `kind` under `topology`.
///
/// Irrelevant selectors are cleared, relevant ones are defaulted when empty
/// or stale:
/// 1. node: first topology node (link kinds: the selected link's first
///    endpoint)
/// 2. interface: first interface of the node
/// 3. link: first link
/// 4. loop nodes: first and second node, both first when only one exists
pub fn resolve(kind: FaultKind, topology: &TopologySnapshot, entry: &FaultEntry) -> FaultEntry {
    let mut out = entry.clone();
    out.set_kind(kind);
    let relevant = kind.relevant_fields();

    if relevant.contains(Field::TargetLink) {
        out.target.link = match topology.find_link(&out.target.link) {
            Some(link) => link.key(),
            None => topology.first_link().map(|l| l.key()).unwrap_or_default(),
        };
    } else {
        out.target.link.clear();
    }

    if relevant.contains(Field::TargetNode) {
        if !topology.contains_node(&out.target.node) {
            out.target.node = default_node(kind, topology, &out.target.link);
        }
    } else {
        out.target.node.clear();
    }

    if relevant.contains(Field::TargetInterface) {
        cascade_interface(topology, &mut out);
    } else {
        out.target.interface.clear();
    }

    if let FaultSpec::RoutingLoopTimed(params) = &mut out.spec {
        if !topology.contains_node(&params.node1) {
            params.node1 = topology.first_node().unwrap_or_default().to_string();
        }
        if !topology.contains_node(&params.node2) {
            params.node2 = topology
                .nth_node(1)
                .or_else(|| topology.first_node())
                .unwrap_or_default()
                .to_string();
        }
    }

    if out != *entry {
        trace!(entry = %entry.id, kind = %kind, "cascade corrected entry");
    }
    out
}

/// Empty every selector the entry's kind does not use, leaving the rest as
/// they are.
pub fn clear_irrelevant(entry: &mut FaultEntry) {
    let relevant = entry.kind().relevant_fields();
    if !relevant.contains(Field::TargetLink) {
        entry.target.link.clear();
    }
    if !relevant.contains(Field::TargetNode) {
        entry.target.node.clear();
    }
    if !relevant.contains(Field::TargetInterface) {
        entry.target.interface.clear();
    }
}

/// Re-resolve `entry` under its own kind.
pub fn resolve_in_place(topology: &TopologySnapshot, entry: &mut FaultEntry) {
    *entry = resolve(entry.kind(), topology, entry);
}

/// Rule 2: keep the interface if the node still has it, otherwise take the
/// node's first interface or clear it.
pub fn cascade_interface(topology: &TopologySnapshot, entry: &mut FaultEntry) {
    let interfaces = topology.interfaces(&entry.target.node);
    if !interfaces.iter().any(|i| *i == entry.target.interface) {
        entry.target.interface = interfaces.first().cloned().unwrap_or_default();
    }
}

/// Point a link-kind entry's node at the selected link when it is not one of
/// the link's endpoints.
pub fn reanchor_to_link(topology: &TopologySnapshot, entry: &mut FaultEntry) {
    if !entry.kind().is_link_op() {
        return;
    }
    let Some(link) = topology.find_link(&entry.target.link) else {
        return;
    };
    if !link.has_endpoint(&entry.target.node) {
        entry.target.node = default_node(entry.kind(), topology, &link.key());
        cascade_interface(topology, entry);
    }
}

/// True when every relevant selector is either empty or a valid reference,
/// and every irrelevant selector is empty.
pub fn is_consistent(topology: &TopologySnapshot, entry: &FaultEntry) -> bool {
    let relevant = entry.kind().relevant_fields();
    let node_ok = if relevant.contains(Field::TargetNode) {
        entry.target.node.is_empty() || topology.contains_node(&entry.target.node)
    } else {
        entry.target.node.is_empty()
    };
    let iface_ok = if relevant.contains(Field::TargetInterface) {
        entry.target.interface.is_empty()
            || topology.has_interface(&entry.target.node, &entry.target.interface)
    } else {
        entry.target.interface.is_empty()
    };
    let link_ok = if relevant.contains(Field::TargetLink) {
        entry.target.link.is_empty()
            || topology
                .find_link(&entry.target.link)
                .is_some_and(|l| l.key() == entry.target.link)
    } else {
        entry.target.link.is_empty()
    };
    let loop_ok = entry.routing_loop().is_none_or(|p| {
        (p.node1.is_empty() || topology.contains_node(&p.node1))
            && (p.node2.is_empty() || topology.contains_node(&p.node2))
    });
    node_ok && iface_ok && link_ok && loop_ok
}

fn default_node(kind: FaultKind, topology: &TopologySnapshot, link_key: &str) -> String {
    if kind.is_link_op()
        && let Some(link) = topology.find_link(link_key)
    {
        let (a, b) = link.endpoints();
        if topology.contains_node(a) {
            return a.to_string();
        }
        if topology.contains_node(b) {
            return b.to_string();
        }
    }
    topology.first_node().unwrap_or_default().to_string()
}
