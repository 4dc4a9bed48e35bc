#[cfg(test)]
mod tests {
    use crate::cache::{CacheStatus, TopologyCache};
    use crate::controller::EditOutcome;
    use crate::error::{DiscoveryError, EditError, SubmitError};
    use crate::kind::{FaultKind, Field};
    use crate::protocol::{ResultDetail, ResultStatus, SubmitResponse};
    use crate::submitter::BatchOutcome;
    use crate::tests::{r1_r2, snapshot};
    use crate::workbench::{RefreshOutcome, Workbench};

    fn ready() -> Workbench {
        let mut wb = Workbench::new(TopologyCache::in_memory());
        let ticket = wb.begin_refresh();
        assert_eq!(
            wb.complete_refresh(ticket, Ok(r1_r2())),
            RefreshOutcome::Applied { corrected: 1 }
        );
        wb
    }

    fn all_success(n: usize) -> SubmitResponse {
        SubmitResponse {
            message: format!("{n}/{n} faults applied"),
            status: ResultStatus::Success,
            details: vec![
                ResultDetail {
                    fault_type: String::new(),
                    status: ResultStatus::Success,
                    message: "ok".into(),
                    target_display: String::new(),
                };
                n
            ],
        }
    }

    #[test]
    fn test_starts_with_one_entry_on_empty_topology() {
        let wb = Workbench::new(TopologyCache::in_memory());
        assert_eq!(wb.entries().len(), 1);
        assert!(wb.entries()[0].target.link.is_empty());
        // link and interface are required but nothing can fill them yet
        assert_eq!(wb.issues().len(), 2);
    }

    #[test]
    fn test_refresh_fills_defaults_and_syncs_controllers() {
        let wb = ready();
        let id = wb.entries()[0].id;
        assert_eq!(wb.entries()[0].target.link, "r1|r2");
        let controller = wb.controller(id).unwrap();
        assert_eq!(controller.text(Field::TargetLink), "r1|r2");
        assert!(wb.cache().is_fresh());
        assert!(!wb.is_refreshing());
    }

    #[test]
    fn test_only_latest_refresh_applies() {
        let mut wb = Workbench::new(TopologyCache::in_memory());
        let first = wb.begin_refresh();
        let second = wb.begin_refresh();
        assert!(second.seq() > first.seq());

        let outcome = wb.complete_refresh(second, Ok(r1_r2()));
        assert!(matches!(outcome, RefreshOutcome::Applied { .. }));
        assert_eq!(
            wb.complete_refresh(first, Ok(snapshot(&[("x", &[])], &[]))),
            RefreshOutcome::Superseded
        );
        assert_eq!(wb.topology().nodes, ["r1", "r2"]);
    }

    #[test]
    fn test_failed_refresh_keeps_entries() {
        let mut wb = ready();
        let before = wb.entries().to_vec();

        let ticket = wb.begin_refresh();
        let err = DiscoveryError::Status {
            status: 503,
            message: "containerlab not running".into(),
        };
        assert_eq!(
            wb.complete_refresh(ticket, Err(err.clone())),
            RefreshOutcome::Failed(err)
        );
        assert_eq!(wb.entries(), before.as_slice());
        assert!(wb.topology().is_empty());
        assert!(matches!(wb.cache().status(), CacheStatus::Failed { .. }));
    }

    #[test]
    fn test_edits_after_failed_refresh_keep_targets() {
        let mut wb = ready();
        let link = wb.entries()[0].id;
        let node = wb.add().unwrap();
        wb.set_kind(node, FaultKind::NodeStop).unwrap();

        let ticket = wb.begin_refresh();
        wb.complete_refresh(ticket, Err(DiscoveryError::Transport("down".into())));
        assert!(wb.cache().snapshot().is_none());

        assert_eq!(
            wb.edit(link, Field::TargetInterface, "eth2").unwrap(),
            EditOutcome::Committed
        );
        let entry = wb.set().get(link).unwrap();
        assert_eq!(entry.target.node, "r1");
        assert_eq!(entry.target.interface, "eth2");
        assert_eq!(entry.target.link, "r1|r2");

        // Stored as typed; nothing to check it against.
        wb.edit(node, Field::TargetNode, "r7").unwrap();
        assert_eq!(wb.set().get(node).unwrap().target.node, "r7");
        assert_eq!(wb.controller(node).unwrap().text(Field::TargetNode), "r7");

        // A kind change still hides what the new kind does not use.
        wb.set_kind(link, FaultKind::TcClear).unwrap();
        let entry = wb.set().get(link).unwrap();
        assert_eq!(entry.target.node, "r1");
        assert_eq!(entry.target.interface, "eth2");
        assert!(entry.target.link.is_empty());

        // The next good refresh corrects the stale values.
        let ticket = wb.begin_refresh();
        assert_eq!(
            wb.complete_refresh(ticket, Ok(r1_r2())),
            RefreshOutcome::Applied { corrected: 2 }
        );
        assert_eq!(wb.set().get(node).unwrap().target.node, "r1");
        assert_eq!(wb.set().get(link).unwrap().target.interface, "eth1");
    }

    #[test]
    fn test_edits_locked_while_submitting() {
        let mut wb = ready();
        let id = wb.entries()[0].id;
        let ticket = wb.begin_submit().unwrap();
        assert_eq!(ticket.len(), 1);
        assert!(wb.is_submitting());

        assert_eq!(wb.add().unwrap_err(), EditError::Busy);
        assert_eq!(wb.remove(id).unwrap_err(), EditError::Busy);
        assert_eq!(
            wb.set_kind(id, FaultKind::NodeStop).unwrap_err(),
            EditError::Busy
        );
        assert_eq!(wb.begin_submit().unwrap_err(), SubmitError::Busy);

        let report = wb.complete_submit(ticket, Ok(all_success(1)));
        assert_eq!(report.outcome, BatchOutcome::Succeeded);
        assert!(!wb.is_submitting());
        assert!(wb.add().is_ok());
    }

    #[test]
    fn test_refresh_during_submit_does_not_touch_in_flight_batch() {
        let mut wb = ready();
        let ticket = wb.begin_submit().unwrap();
        let sent = ticket.payloads().to_vec();

        let refresh = wb.begin_refresh();
        wb.complete_refresh(refresh, Ok(snapshot(&[("r3", &["eth0"])], &[])));
        assert_eq!(ticket.payloads(), sent.as_slice());
        assert_eq!(sent[0].target_link.as_deref(), Some("r1|r2"));

        wb.complete_submit(ticket, Ok(all_success(1)));
        assert!(wb.entries()[0].target.link.is_empty());
    }

    #[test]
    fn test_pending_draft_blocks_submission() {
        let mut wb = ready();
        let id = wb.entries()[0].id;
        wb.set_kind(id, FaultKind::AddLatency).unwrap();
        let outcome = wb.edit(id, Field::LatencyMs, "ten").unwrap();
        assert!(matches!(outcome, EditOutcome::Pending { .. }));

        match wb.begin_submit() {
            Err(SubmitError::Invalid(issues)) => assert_eq!(issues[0].field, Field::LatencyMs),
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert!(!wb.is_submitting());

        wb.discard(id, Field::LatencyMs).unwrap();
        assert!(wb.begin_submit().is_ok());
    }

    #[test]
    fn test_remove_last_reseeds_controller() {
        let mut wb = ready();
        let id = wb.entries()[0].id;
        let new_id = wb.remove(id).unwrap().unwrap();
        assert!(wb.controller(id).is_none());
        assert_eq!(wb.controller(new_id).unwrap().text(Field::TargetNode), "r1");
    }

    #[test]
    fn test_options_reject_hidden_field() {
        let wb = ready();
        let id = wb.entries()[0].id;
        assert_eq!(wb.options(id, Field::TargetLink).unwrap(), ["r1|r2"]);
        assert!(matches!(
            wb.options(id, Field::LatencyMs),
            Err(EditError::IrrelevantField { .. })
        ));
    }

    #[test]
    fn test_notice_attaches_to_last_report() {
        let mut wb = ready();
        wb.add_notice("dropped: no report yet");
        assert!(wb.last_report().is_none());

        let ticket = wb.begin_submit().unwrap();
        wb.complete_submit(ticket, Err(SubmitError::Transport("refused".into())));
        wb.add_notice("fault flag not set");
        let report = wb.last_report().unwrap();
        assert_eq!(report.outcome, BatchOutcome::TransportFailed);
        assert_eq!(report.notices, ["fault flag not set"]);
    }
}
