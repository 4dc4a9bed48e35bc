//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use fault_console::{
    BatchReport, LabClient, RefreshOutcome, SessionStore, TopologyCache, Workbench,
};
use lab_sim::{LabTopology, MockLab};

/// Start a mock lab serving `topology`. Panics if it cannot bind.
pub async fn start_lab(topology: LabTopology) -> MockLab {
    MockLab::start(topology).await.expect("start mock lab")
}

pub fn client_for(lab: &MockLab) -> LabClient {
    LabClient::new(&lab.base_url(), Duration::from_secs(5)).expect("build client")
}

pub fn session_in(dir: &Path) -> SessionStore {
    SessionStore::new(dir.join("session.json"))
}

/// Workbench persisting into `dir`, seeded from whatever is there.
pub fn workbench_in(dir: &Path) -> Workbench {
    let mut cache = TopologyCache::new(session_in(dir));
    cache.load();
    Workbench::new(cache)
}

/// Run one refresh to completion.
pub async fn refresh(wb: &mut Workbench, client: &LabClient) -> RefreshOutcome {
    let ticket = wb.begin_refresh();
    let result = client.fetch_topology().await;
    wb.complete_refresh(ticket, result)
}

/// Submit the whole batch and return the report. Panics on local rejection.
pub async fn submit(wb: &mut Workbench, client: &LabClient) -> BatchReport {
    let ticket = wb.begin_submit().expect("batch should be submittable");
    let result = client.submit_batch(ticket.payloads()).await;
    wb.complete_submit(ticket, result).clone()
}
