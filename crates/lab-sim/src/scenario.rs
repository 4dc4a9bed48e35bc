use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::topology::LabTopology;

/// Bounds of the topology churn.
#[derive(Debug, Clone)]
pub struct ChurnConfig {
    /// RNG seed for reproducibility.
    pub seed: u64,
    /// Number of topologies to generate after the initial one.
    pub steps: usize,
    /// Node names are drawn from `r1..=rN`.
    pub node_pool: usize,
    /// Maximum interfaces per node besides `eth0`.
    pub max_links_per_node: usize,
    /// Probability that a step yields an empty lab.
    pub empty_probability: f64,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            steps: 50,
            node_pool: 6,
            max_links_per_node: 3,
            empty_probability: 0.05,
        }
    }
}

/// Deterministic sequence of lab topologies.
///
/// Every frame is drawn independently from the seeded RNG: a random subset
/// of the node pool, random links between present nodes, and interfaces
/// allocated per link. Consecutive frames therefore add, remove and rename
/// things freely, which is what re-resolution has to survive.
#[derive(Debug)]
pub struct TopologyChurn {
    cfg: ChurnConfig,
    rng: StdRng,
}

impl TopologyChurn {
    pub fn new(cfg: ChurnConfig) -> Self {
        let rng = StdRng::seed_from_u64(cfg.seed);
        Self { cfg, rng }
    }

    /// Initial frame plus `steps` more.
    pub fn frames(&mut self) -> Vec<LabTopology> {
        (0..=self.cfg.steps).map(|_| self.next_frame()).collect()
    }

    fn next_frame(&mut self) -> LabTopology {
        if self.rng.random::<f64>() < self.cfg.empty_probability {
            return LabTopology::new();
        }

        let mut names: Vec<String> = (1..=self.cfg.node_pool)
            .filter(|_| self.rng.random::<f64>() < 0.7)
            .map(|i| format!("r{i}"))
            .collect();
        if names.is_empty() {
            names.push(format!("r{}", self.rng.random_range(1..=self.cfg.node_pool.max(1))));
        }
        // Discovery order is not sorted; shuffle it a little.
        if names.len() > 1 && self.rng.random::<bool>() {
            let i = self.rng.random_range(0..names.len());
            let j = self.rng.random_range(0..names.len());
            names.swap(i, j);
        }

        let mut topo = LabTopology::new();
        for name in &names {
            topo = topo.node(name, &["eth0"]);
        }

        let mut degree = vec![0usize; names.len()];
        for a in 0..names.len() {
            for b in (a + 1)..names.len() {
                if degree[a] >= self.cfg.max_links_per_node
                    || degree[b] >= self.cfg.max_links_per_node
                    || self.rng.random::<f64>() >= 0.4
                {
                    continue;
                }
                degree[a] += 1;
                degree[b] += 1;
                topo = topo.connect(&names[a], &names[b]);
            }
        }
        topo
    }
}
