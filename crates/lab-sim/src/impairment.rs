use serde::{Deserialize, Serialize};

use crate::topology::LabTopology;

/// One element of a fault batch as the lab receives it. IP addresses stay
/// strings; the lab only echoes them into commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultRequest {
    pub fault_type: String,
    pub target_node: Option<String>,
    pub target_interface: Option<String>,
    pub target_link: Option<String>,
    pub latency_ms: Option<u32>,
    pub jitter_ms: Option<u32>,
    pub correlation_percent: Option<u8>,
    pub bandwidth_rate_kbit: Option<u64>,
    pub bandwidth_burst_bytes: Option<u64>,
    pub bandwidth_latency_ms: Option<u32>,
    pub loop_node1: Option<String>,
    pub loop_node2: Option<String>,
    pub loop_dummy_dest_ip: Option<String>,
    pub loop_duration_sec: Option<u32>,
    pub loop_ping_target_ip: Option<String>,
    pub loop_ping_count: Option<u32>,
}

/// What the lab would run for one fault, and how it names the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub target_display: String,
    pub commands: Vec<Vec<String>>,
}

impl ExecutionPlan {
    /// Commands as shell lines, `; `-joined.
    pub fn script(&self) -> String {
        self.commands
            .iter()
            .map(|c| c.join(" "))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

/// Build the command plan for `req`, or the lab's rejection message.
pub fn plan(req: &FaultRequest) -> Result<ExecutionPlan, String> {
    let kind = req.fault_type.as_str();
    match kind {
        "link_down" | "link_up" => {
            let (Some(link), Some(iface)) =
                (present(&req.target_link), present(&req.target_interface))
            else {
                return Err(
                    "Target link and interface must be selected/entered for link operations."
                        .into(),
                );
            };
            let node = match present(&req.target_node) {
                Some(node) => node,
                None => link.split('|').next().unwrap_or(link),
            };
            let action = if kind == "link_down" { "down" } else { "up" };
            Ok(ExecutionPlan {
                target_display: format!(
                    "{kind} on link {} interface {iface} of node {node}",
                    link.replace('|', "-")
                ),
                commands: vec![argv(&[
                    "docker", "exec", node, "ip", "link", "set", iface, action,
                ])],
            })
        }

        "node_stop" | "node_start" | "node_pause" | "node_unpause" => {
            let Some(node) = present(&req.target_node) else {
                return Err("Target node must be selected.".into());
            };
            let action = kind.trim_start_matches("node_");
            Ok(ExecutionPlan {
                target_display: format!("node {node}"),
                commands: vec![argv(&["docker", action, node])],
            })
        }

        "add_latency" => {
            let (Some(node), Some(iface), Some(latency)) = (
                present(&req.target_node),
                present(&req.target_interface),
                req.latency_ms,
            ) else {
                return Err("Target Node, Target Interface, and Latency (ms) are required for adding latency.".into());
            };
            if latency == 0 {
                return Err(format!(
                    "Invalid Latency value: {latency}. Must be a positive integer."
                ));
            }
            let mut cmd = argv(&[
                "docker", "exec", node, "tc", "qdisc", "add", "dev", iface, "root", "netem",
                "delay",
            ]);
            cmd.push(format!("{latency}ms"));
            if let Some(jitter) = req.jitter_ms
                && jitter > 0
            {
                cmd.push(format!("{jitter}ms"));
                if let Some(corr) = req.correlation_percent {
                    cmd.push(format!("{corr}%"));
                }
            }
            Ok(ExecutionPlan {
                target_display: format!(
                    "latency ({latency}ms) on node {node}, interface {iface}"
                ),
                commands: vec![cmd],
            })
        }

        "limit_bandwidth" => {
            let (Some(node), Some(iface), Some(rate)) = (
                present(&req.target_node),
                present(&req.target_interface),
                req.bandwidth_rate_kbit,
            ) else {
                return Err("Target Node, Target Interface, and Bandwidth Rate (kbit) are required for limiting bandwidth.".into());
            };
            if rate == 0 {
                return Err(format!(
                    "Invalid Bandwidth Rate value: {rate}. Must be a positive integer."
                ));
            }
            // A tenth of a second worth of bytes unless given.
            let burst = req
                .bandwidth_burst_bytes
                .unwrap_or(rate * 1000 / 8 / 10)
                .to_string();
            let latency = format!("{}ms", req.bandwidth_latency_ms.unwrap_or(50));
            let rate_arg = format!("{rate}kbit");
            Ok(ExecutionPlan {
                target_display: format!(
                    "bandwidth limit ({rate}kbit) on node {node}, interface {iface}"
                ),
                commands: vec![argv(&[
                    "docker", "exec", node, "tc", "qdisc", "add", "dev", iface, "root", "tbf",
                    "rate", &rate_arg, "burst", &burst, "latency", &latency,
                ])],
            })
        }

        "tc_clear" => {
            let (Some(node), Some(iface)) =
                (present(&req.target_node), present(&req.target_interface))
            else {
                return Err(
                    "Target Node and Target Interface are required for clearing tc rules.".into(),
                );
            };
            Ok(ExecutionPlan {
                target_display: format!("tc rules on node {node}, interface {iface}"),
                commands: vec![argv(&[
                    "docker", "exec", node, "tc", "qdisc", "del", "dev", iface, "root",
                ])],
            })
        }

        "routing_loop_timed" => {
            let (Some(n1), Some(n2), Some(dest), Some(duration)) = (
                present(&req.loop_node1),
                present(&req.loop_node2),
                present(&req.loop_dummy_dest_ip),
                req.loop_duration_sec,
            ) else {
                return Err("Loop nodes, dummy destination and duration are required for a routing loop.".into());
            };
            if n1 == n2 {
                return Err("Loop nodes must differ.".into());
            }
            let mut commands = vec![
                argv(&["docker", "exec", n1, "ip", "route", "replace", dest, "via", n2]),
                argv(&["docker", "exec", n2, "ip", "route", "replace", dest, "via", n1]),
            ];
            if let Some(target) = present(&req.loop_ping_target_ip) {
                let count = req.loop_ping_count.unwrap_or(5).to_string();
                commands.push(argv(&["docker", "exec", n1, "ping", "-c", &count, target]));
            }
            let secs = duration.to_string();
            commands.push(argv(&["sleep", &secs]));
            commands.push(argv(&["docker", "exec", n1, "ip", "route", "del", dest]));
            commands.push(argv(&["docker", "exec", n2, "ip", "route", "del", dest]));
            Ok(ExecutionPlan {
                target_display: format!(
                    "routing loop between {n1} and {n2} for {dest} ({duration}s)"
                ),
                commands,
            })
        }

        other => Err(format!("Unknown fault type: {other}")),
    }
}

/// Reject targets the lab does not have.
pub fn check_targets(req: &FaultRequest, topo: &LabTopology) -> Result<(), String> {
    for node in [&req.target_node, &req.loop_node1, &req.loop_node2]
        .into_iter()
        .filter_map(present)
    {
        if !topo.has_node(node) {
            return Err(format!("No such container: {node}"));
        }
    }
    if let Some(link) = present(&req.target_link)
        && !topo.has_link(link)
    {
        return Err(format!("No such link: {link}"));
    }
    if let Some(iface) = present(&req.target_interface) {
        let node = present(&req.target_node)
            .or_else(|| present(&req.target_link).and_then(|l| l.split('|').next()));
        if let Some(node) = node
            && !topo.has_interface(node, iface)
        {
            return Err(format!("Cannot find device \"{iface}\" on {node}"));
        }
    }
    Ok(())
}
