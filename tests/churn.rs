//! Seeded topology churn: every entry stays consistent with whatever the
//! lab looks like after each refresh.

use fault_console::resolver::is_consistent;
use fault_console::{FaultKind, Field, RefreshOutcome, TopologyCache, TopologySnapshot, Workbench};
use lab_sim::{ChurnConfig, LabTopology, TopologyChurn, WireStyle};

fn snapshot_of(frame: &LabTopology) -> TopologySnapshot {
    serde_json::from_value(frame.to_json(WireStyle::Canonical)).expect("frame parses")
}

/// One entry of every kind.
fn full_batch() -> Workbench {
    let mut wb = Workbench::new(TopologyCache::in_memory());
    let first = wb.entries()[0].id;
    wb.set_kind(first, FaultKind::ALL[0]).unwrap();
    for kind in &FaultKind::ALL[1..] {
        let id = wb.add().unwrap();
        wb.set_kind(id, *kind).unwrap();
    }
    wb
}

fn run_churn(cfg: ChurnConfig) {
    let frames = TopologyChurn::new(cfg).frames();
    let mut wb = full_batch();

    for (step, frame) in frames.iter().enumerate() {
        let topology = snapshot_of(frame);
        let before = wb.entries().to_vec();

        let ticket = wb.begin_refresh();
        let outcome = wb.complete_refresh(ticket, Ok(topology.clone()));
        assert!(
            matches!(outcome, RefreshOutcome::Applied { .. }),
            "step {step}: {outcome:?}"
        );

        for (old, entry) in before.iter().zip(wb.entries()) {
            assert_eq!(old.kind(), entry.kind());
            assert!(
                is_consistent(&topology, entry),
                "step {step}: {} inconsistent: {:?}",
                entry.id,
                entry.target
            );
            // Valid selections survive a refresh.
            if entry.kind().is_relevant(Field::TargetNode) && topology.contains_node(&old.target.node) {
                assert_eq!(old.target.node, entry.target.node, "step {step}");
            }
            // Nothing is left empty that the topology could fill.
            if entry.kind().is_relevant(Field::TargetNode) && !topology.is_empty() {
                assert!(!entry.target.node.is_empty(), "step {step}");
            }
            let controller = wb.controller(entry.id).unwrap();
            assert_eq!(
                controller.text(Field::TargetNode),
                entry.value_text(Field::TargetNode)
            );
        }
    }
}

#[test]
fn test_default_churn_stays_consistent() {
    run_churn(ChurnConfig::default());
}

#[test]
fn test_dense_churn_with_frequent_empty_labs() {
    for seed in 1..=5 {
        run_churn(ChurnConfig {
            seed,
            steps: 30,
            node_pool: 4,
            max_links_per_node: 4,
            empty_probability: 0.3,
        });
    }
}
