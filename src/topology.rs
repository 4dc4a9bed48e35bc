//! Discovered lab topology.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Separator of the canonical link key (`a|b`).
pub const LINK_KEY_SEPARATOR: char = '|';

/// Unordered node pair. Serialized as a two-element array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link(pub String, pub String);

impl Link {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Link(a.into(), b.into())
    }

    /// Canonical key in discovery orientation.
    pub fn key(&self) -> String {
        format!("{}{}{}", self.0, LINK_KEY_SEPARATOR, self.1)
    }

    pub fn endpoints(&self) -> (&str, &str) {
        (&self.0, &self.1)
    }

    pub fn has_endpoint(&self, node: &str) -> bool {
        self.0 == node || self.1 == node
    }

    /// True if `key` names this link in either orientation.
    pub fn matches_key(&self, key: &str) -> bool {
        match split_link_key(key) {
            Some((a, b)) => (a == self.0 && b == self.1) || (a == self.1 && b == self.0),
            None => false,
        }
    }
}

/// Split `a|b` into its endpoints.
pub fn split_link_key(key: &str) -> Option<(&str, &str)> {
    let (a, b) = key.split_once(LINK_KEY_SEPARATOR)?;
    if a.is_empty() || b.is_empty() || b.contains(LINK_KEY_SEPARATOR) {
        return None;
    }
    Some((a, b))
}

/// Nodes, links and per-node interfaces at one point in time.
///
/// Discovery order is meaningful: "first node" and "first link" always mean
/// first as delivered, never sorted. The snapshot is taken as delivered; a
/// link or interface entry naming an unknown node is kept but never offered
/// for selection through a node that does not exist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    #[serde(alias = "containers")]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(
        rename = "interfacesByNode",
        alias = "interfaces_by_node",
        alias = "interfaces_by_container",
        default
    )]
    pub interfaces_by_node: FxHashMap<String, Vec<String>>,
}

impl TopologySnapshot {
    /// A snapshot with no nodes. Valid, and distinct from "not fetched".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, node: &str) -> bool {
        !node.is_empty() && self.nodes.iter().any(|n| n == node)
    }

    pub fn first_node(&self) -> Option<&str> {
        self.nodes.first().map(String::as_str)
    }

    pub fn nth_node(&self, idx: usize) -> Option<&str> {
        self.nodes.get(idx).map(String::as_str)
    }

    /// Interfaces of `node` in discovery order; empty for unknown nodes.
    pub fn interfaces(&self, node: &str) -> &[String] {
        if !self.contains_node(node) {
            return &[];
        }
        self.interfaces_by_node
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_interface(&self, node: &str, interface: &str) -> bool {
        !interface.is_empty() && self.interfaces(node).iter().any(|i| i == interface)
    }

    /// Look up a link by key in either orientation.
    pub fn find_link(&self, key: &str) -> Option<&Link> {
        if key.is_empty() {
            return None;
        }
        self.links.iter().find(|link| link.matches_key(key))
    }

    pub fn first_link(&self) -> Option<&Link> {
        self.links.first()
    }

    pub fn link_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.links.iter().map(Link::key)
    }

    /// Short human summary for status lines.
    pub fn summary(&self) -> String {
        let interfaces: usize = self
            .nodes
            .iter()
            .map(|n| self.interfaces(n).len())
            .sum();
        format!(
            "{} nodes, {} links, {} interfaces",
            self.nodes.len(),
            self.links.len(),
            interfaces
        )
    }
}
