use serde_json::{Map, Value, json};

/// A container node and its interfaces, in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabNode {
    pub name: String,
    pub interfaces: Vec<String>,
}

/// Key naming of the discovery response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WireStyle {
    /// `nodes` / `links` / `interfacesByNode`.
    #[default]
    Canonical,
    /// `containers` / `links` / `interfaces_by_container`, as a
    /// containerlab-backed service reports it.
    Containerlab,
}

/// In-memory lab: nodes, point-to-point links and per-node interfaces.
///
/// Order is preserved everywhere so that "first node" and "first link" are
/// stable across renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabTopology {
    nodes: Vec<LabNode>,
    links: Vec<(String, String)>,
}

impl LabTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the given interfaces. Re-adding a name replaces its
    /// interface list.
    pub fn node(mut self, name: &str, interfaces: &[&str]) -> Self {
        let interfaces = interfaces.iter().map(|i| i.to_string()).collect();
        match self.nodes.iter_mut().find(|n| n.name == name) {
            Some(node) => node.interfaces = interfaces,
            None => self.nodes.push(LabNode {
                name: name.to_string(),
                interfaces,
            }),
        }
        self
    }

    /// Add a link without touching interfaces.
    pub fn link(mut self, a: &str, b: &str) -> Self {
        self.links.push((a.to_string(), b.to_string()));
        self
    }

    /// Add a link and give each known endpoint the next free `ethN`.
    pub fn connect(mut self, a: &str, b: &str) -> Self {
        for end in [a, b] {
            if let Some(node) = self.nodes.iter_mut().find(|n| n.name == end) {
                let next = node.interfaces.len();
                node.interfaces.push(format!("eth{next}"));
            }
        }
        self.link(a, b)
    }

    pub fn nodes(&self) -> &[LabNode] {
        &self.nodes
    }

    pub fn node_names(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.name.clone()).collect()
    }

    pub fn links(&self) -> &[(String, String)] {
        &self.links
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    pub fn interfaces(&self, node: &str) -> &[String] {
        self.nodes
            .iter()
            .find(|n| n.name == node)
            .map_or(&[], |n| n.interfaces.as_slice())
    }

    pub fn has_interface(&self, node: &str, interface: &str) -> bool {
        self.interfaces(node).iter().any(|i| i == interface)
    }

    /// Link `a|b` in either orientation.
    pub fn has_link(&self, key: &str) -> bool {
        let Some((a, b)) = key.split_once('|') else {
            return false;
        };
        self.links
            .iter()
            .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
    }

    /// Copy with `name` and every link touching it removed.
    pub fn without_node(&self, name: &str) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .filter(|n| n.name != name)
                .cloned()
                .collect(),
            links: self
                .links
                .iter()
                .filter(|(a, b)| a != name && b != name)
                .cloned()
                .collect(),
        }
    }

    /// Copy without one interface of one node.
    pub fn without_interface(&self, node: &str, interface: &str) -> Self {
        let mut copy = self.clone();
        if let Some(n) = copy.nodes.iter_mut().find(|n| n.name == node) {
            n.interfaces.retain(|i| i != interface);
        }
        copy
    }

    /// Discovery response body.
    pub fn to_json(&self, style: WireStyle) -> Value {
        let names: Vec<&str> = self.nodes.iter().map(|n| n.name.as_str()).collect();
        let links: Vec<[&str; 2]> = self
            .links
            .iter()
            .map(|(a, b)| [a.as_str(), b.as_str()])
            .collect();
        let mut interfaces = Map::new();
        for node in &self.nodes {
            interfaces.insert(node.name.clone(), json!(node.interfaces));
        }

        match style {
            WireStyle::Canonical => json!({
                "nodes": names,
                "links": links,
                "interfacesByNode": interfaces,
            }),
            WireStyle::Containerlab => json!({
                "containers": names,
                "links": links,
                "interfaces_by_container": interfaces,
            }),
        }
    }
}

/// `r1` and `r2` joined on `eth1`, both with a management `eth0`.
pub fn two_routers() -> LabTopology {
    LabTopology::new()
        .node("r1", &["eth0"])
        .node("r2", &["eth0"])
        .connect("r1", "r2")
}

/// `r1 - r2 - ... - rN`.
pub fn line(n: usize) -> LabTopology {
    let mut topo = LabTopology::new();
    for i in 1..=n {
        topo = topo.node(&format!("r{i}"), &["eth0"]);
    }
    for i in 1..n {
        topo = topo.connect(&format!("r{i}"), &format!("r{}", i + 1));
    }
    topo
}

/// [`line`] closed back onto `r1`.
pub fn ring(n: usize) -> LabTopology {
    let topo = line(n);
    if n < 3 {
        return topo;
    }
    topo.connect(&format!("r{n}"), "r1")
}
