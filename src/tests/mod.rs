use crate::topology::{Link, TopologySnapshot};

/// Snapshot from `(node, interfaces)` pairs and links, in the given order.
#[cfg(test)]
pub(crate) fn snapshot(nodes: &[(&str, &[&str])], links: &[(&str, &str)]) -> TopologySnapshot {
    TopologySnapshot {
        nodes: nodes.iter().map(|(n, _)| n.to_string()).collect(),
        links: links.iter().map(|(a, b)| Link::new(*a, *b)).collect(),
        interfaces_by_node: nodes
            .iter()
            .map(|(n, ifaces)| (n.to_string(), ifaces.iter().map(|i| i.to_string()).collect()))
            .collect(),
    }
}

/// `r1` and `r2`, one link, one interface each.
#[cfg(test)]
pub(crate) fn r1_r2() -> TopologySnapshot {
    snapshot(&[("r1", &["eth1"]), ("r2", &["eth1"])], &[("r1", "r2")])
}







#[cfg(test)]
pub mod workbench_tests;
