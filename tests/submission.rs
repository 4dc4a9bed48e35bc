//! Batch submission against the mock lab, including the console's
//! fault-flag follow-up.

mod common;

use std::time::Duration;

use fault_console::console::{Console, Event, Flow};
use fault_console::protocol::{ResultStatus, UNKNOWN_RESULT_MESSAGE};
use fault_console::{BatchOutcome, FaultKind, Field, Workbench};
use lab_sim::{Behaviour, MockLab, two_routers};
use tokio::sync::mpsc;

/// Refreshed workbench with `link_down r1|r2` and `node_stop r1`.
async fn two_entry_batch(lab: &MockLab) -> (Workbench, tempfile::TempDir) {
    let client = common::client_for(lab);
    let dir = tempfile::tempdir().unwrap();
    let mut wb = common::workbench_in(dir.path());
    common::refresh(&mut wb, &client).await;
    let id = wb.add().unwrap();
    wb.set_kind(id, FaultKind::NodeStop).unwrap();
    (wb, dir)
}

#[tokio::test]
async fn test_all_faults_applied() {
    let lab = common::start_lab(two_routers()).await;
    let client = common::client_for(&lab);
    let (mut wb, _dir) = two_entry_batch(&lab).await;

    let report = common::submit(&mut wb, &client).await;
    assert_eq!(report.outcome, BatchOutcome::Succeeded);
    assert_eq!(report.message, "2/2 faults applied");
    assert_eq!(
        report.items[0].target_display,
        "link_down on link r1-r2 interface eth0 of node r1"
    );
    assert_eq!(report.items[1].target_display, "node r1");
    assert!(report.items[1].message.contains("docker stop r1"));

    let batches = lab.batches();
    assert_eq!(batches.len(), 1);
    let sent = &batches[0];
    assert_eq!(sent[0].fault_type, "link_down");
    assert_eq!(sent[0].target_link.as_deref(), Some("r1|r2"));
    assert_eq!(sent[1].fault_type, "node_stop");
    assert_eq!(sent[1].target_interface, None);
    assert_eq!(sent[1].target_link, None);
}

#[tokio::test]
async fn test_short_response_leaves_unknown() {
    let lab = common::start_lab(two_routers()).await;
    lab.set_behaviour(Behaviour::Truncate(1));
    let client = common::client_for(&lab);
    let (mut wb, _dir) = two_entry_batch(&lab).await;

    let report = common::submit(&mut wb, &client).await;
    assert_eq!(report.outcome, BatchOutcome::Partial);
    assert_eq!(report.items.len(), 2);
    assert_eq!(report.items[1].status, ResultStatus::Unknown);
    assert_eq!(report.items[1].message, UNKNOWN_RESULT_MESSAGE);
    assert_eq!(report.notices.len(), 1);
}

#[tokio::test]
async fn test_surplus_results_are_ignored() {
    let lab = common::start_lab(two_routers()).await;
    lab.set_behaviour(Behaviour::Surplus(2));
    let client = common::client_for(&lab);
    let (mut wb, _dir) = two_entry_batch(&lab).await;

    let report = common::submit(&mut wb, &client).await;
    assert_eq!(report.outcome, BatchOutcome::Succeeded);
    assert_eq!(report.items.len(), 2);
    assert_eq!(report.notices, ["ignored 2 surplus result(s)"]);
}

#[tokio::test]
async fn test_item_error_is_verbatim() {
    let lab = common::start_lab(two_routers()).await;
    lab.set_status_for("node_stop", "error", "Error response from daemon: No such container: r1");
    let client = common::client_for(&lab);
    let (mut wb, _dir) = two_entry_batch(&lab).await;

    let report = common::submit(&mut wb, &client).await;
    assert_eq!(report.outcome, BatchOutcome::Partial);
    assert_eq!(report.items[0].status, ResultStatus::Success);
    assert_eq!(report.items[1].status, ResultStatus::Error);
    assert_eq!(
        report.items[1].message,
        "Error response from daemon: No such container: r1"
    );
}

#[tokio::test]
async fn test_stale_target_rejected_by_lab() {
    let lab = common::start_lab(two_routers().node("r3", &["eth0"])).await;
    let client = common::client_for(&lab);
    let dir = tempfile::tempdir().unwrap();
    let mut wb = common::workbench_in(dir.path());
    common::refresh(&mut wb, &client).await;
    let id = wb.entries()[0].id;
    wb.set_kind(id, FaultKind::NodeStop).unwrap();
    wb.edit(id, Field::TargetNode, "r3").unwrap();

    // The lab changes behind the console's back.
    lab.set_topology(two_routers());
    let report = common::submit(&mut wb, &client).await;
    assert_eq!(report.outcome, BatchOutcome::Failed);
    assert_eq!(report.items[0].message, "No such container: r3");
    // Empty display from the lab falls back to the local description.
    assert_eq!(report.items[0].target_display, "node r3");
}

#[tokio::test]
async fn test_rejected_request_has_no_items() {
    let lab = common::start_lab(two_routers()).await;
    let client = common::client_for(&lab);
    let (mut wb, _dir) = two_entry_batch(&lab).await;

    lab.set_behaviour(Behaviour::Fail {
        status: 500,
        message: "docker: permission denied".into(),
    });
    let report = common::submit(&mut wb, &client).await;
    assert_eq!(report.outcome, BatchOutcome::TransportFailed);
    assert!(report.items.is_empty());
    assert_eq!(
        report.message,
        "fault service answered 500: docker: permission denied"
    );

    assert_eq!(lab.batches().len(), 1);
}

#[tokio::test]
async fn test_unreadable_answer_reports_unknown_items() {
    let lab = common::start_lab(two_routers()).await;
    let client = common::client_for(&lab);
    let (mut wb, _dir) = two_entry_batch(&lab).await;

    lab.set_behaviour(Behaviour::Garbage);
    let report = common::submit(&mut wb, &client).await;
    assert_eq!(report.outcome, BatchOutcome::Unconfirmed);
    assert!(report.message.starts_with("malformed fault response"));
    assert_eq!(report.items.len(), 2);
    assert!(report.items.iter().all(|i| i.status == ResultStatus::Unknown));
    assert_eq!(report.items[1].target_display, "node r1");
    // The batch did reach the lab.
    assert_eq!(lab.batches().len(), 1);
}

async fn drain_one(console: &mut Console<Vec<u8>>, rx: &mut mpsc::UnboundedReceiver<Event>) {
    let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("event within timeout")
        .expect("channel open");
    console.handle_event(event);
}

#[tokio::test]
async fn test_console_round_trip_sets_fault_flag() {
    let lab = common::start_lab(two_routers()).await;
    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut console = Console::new(
        common::workbench_in(dir.path()),
        common::client_for(&lab),
        true,
        tx,
        Vec::new(),
    );

    assert_eq!(console.handle_line("refresh"), Flow::Continue);
    drain_one(&mut console, &mut rx).await;
    assert_eq!(console.handle_line("submit"), Flow::Continue);
    drain_one(&mut console, &mut rx).await;
    // fault flag follow-up
    drain_one(&mut console, &mut rx).await;
    assert!(console.is_idle());

    assert_eq!(lab.flags(), [true]);
    let out = String::from_utf8_lossy(console.output()).into_owned();
    assert!(out.contains("topology: 2 nodes"));
    assert!(out.contains("batch succeeded: 1/1 faults applied"));
    assert!(console.workbench().last_report().unwrap().notices.is_empty());
}

#[tokio::test]
async fn test_fault_flag_failure_is_noted() {
    let lab = common::start_lab(two_routers()).await;
    lab.fail_fault_flag(503, "influxdb unavailable");
    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut console = Console::new(
        common::workbench_in(dir.path()),
        common::client_for(&lab),
        true,
        tx,
        Vec::new(),
    );

    console.handle_line("refresh");
    drain_one(&mut console, &mut rx).await;
    console.handle_line("submit");
    drain_one(&mut console, &mut rx).await;
    drain_one(&mut console, &mut rx).await;

    let report = console.workbench().last_report().unwrap();
    assert_eq!(report.outcome, BatchOutcome::Succeeded);
    assert_eq!(report.notices.len(), 1);
    assert!(report.notices[0].contains("influxdb unavailable"));
    assert!(lab.flags().is_empty());
}

#[tokio::test]
async fn test_one_shot_submit() {
    use fault_console::{BatchSubmitter, SubmitError};

    let lab = common::start_lab(two_routers()).await;
    let client = common::client_for(&lab);
    let (wb, _dir) = two_entry_batch(&lab).await;

    let report = BatchSubmitter::submit(&client, wb.entries()).await.unwrap();
    assert_eq!(report.outcome, BatchOutcome::Succeeded);
    assert_eq!(report.submitted, 2);

    let err = BatchSubmitter::submit(&client, &[]).await.unwrap_err();
    assert_eq!(err, SubmitError::EmptySet);
    assert_eq!(lab.batches().len(), 1);
}
