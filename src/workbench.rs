//! Owner of all console state.
//!
//! Network work is split into a synchronous `begin_*` step, which hands out a
//! ticket, and a synchronous `complete_*` step, which applies the result. The
//! request itself runs elsewhere, so edits and rendering keep working while
//! it is in flight.

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::cache::TopologyCache;
use crate::config_set::FaultConfigSet;
use crate::controller::{ConfigEntryController, EditOutcome};
use crate::entry::{EntryId, FaultEntry};
use crate::error::{DiscoveryError, EditError, EntryIssue, SubmitError};
use crate::kind::{FaultKind, Field};
use crate::protocol::{FaultPayload, SubmitResponse};
use crate::submitter::{BatchReport, BatchSubmitter, PreparedBatch};
use crate::topology::TopologySnapshot;
use crate::validate::validate_entry;

/// Handle of one topology request. Only the newest ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    seq: u64,
}

impl RefreshTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// The validated batch that is in flight.
#[derive(Debug)]
pub struct SubmitTicket {
    batch: PreparedBatch,
}

impl SubmitTicket {
    pub fn payloads(&self) -> &[FaultPayload] {
        &self.batch.payloads
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New snapshot installed; `corrected` entries had stale references.
    Applied { corrected: usize },
    /// Snapshot cleared. Entries were left as they were.
    Failed(DiscoveryError),
    /// A newer refresh was started after this one; result dropped.
    Superseded,
}

#[derive(Debug)]
pub struct Workbench {
    cache: TopologyCache,
    set: FaultConfigSet,
    controllers: FxHashMap<EntryId, ConfigEntryController>,
    refresh_seq: u64,
    refresh_pending: bool,
    submitting: bool,
    last_report: Option<BatchReport>,
}

impl Workbench {
    /// Start from whatever `cache` holds (possibly a restored session).
    pub fn new(cache: TopologyCache) -> Self {
        let set = FaultConfigSet::new(cache.topology());
        let controllers = set
            .entries()
            .iter()
            .map(|e| (e.id, ConfigEntryController::new(e)))
            .collect();
        Self {
            cache,
            set,
            controllers,
            refresh_seq: 0,
            refresh_pending: false,
            submitting: false,
            last_report: None,
        }
    }

    pub fn cache(&self) -> &TopologyCache {
        &self.cache
    }

    pub fn topology(&self) -> &TopologySnapshot {
        self.cache.topology()
    }

    pub fn set(&self) -> &FaultConfigSet {
        &self.set
    }

    pub fn entries(&self) -> &[FaultEntry] {
        self.set.entries()
    }

    pub fn controller(&self, id: EntryId) -> Option<&ConfigEntryController> {
        self.controllers.get(&id)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh_pending
    }

    pub fn last_report(&self) -> Option<&BatchReport> {
        self.last_report.as_ref()
    }

    fn ensure_editable(&self) -> Result<(), EditError> {
        if self.submitting {
            return Err(EditError::Busy);
        }
        Ok(())
    }

    pub fn add(&mut self) -> Result<EntryId, EditError> {
        self.ensure_editable()?;
        let id = self.set.add(self.cache.topology());
        self.attach(id);
        Ok(id)
    }

    /// Remove `id`. Returns the id of the replacement entry when the set
    /// had to be reseeded.
    pub fn remove(&mut self, id: EntryId) -> Result<Option<EntryId>, EditError> {
        self.ensure_editable()?;
        let reseeded = self.set.remove(id, self.cache.topology())?;
        self.controllers.remove(&id);
        if let Some(new_id) = reseeded {
            self.attach(new_id);
        }
        Ok(reseeded)
    }

    pub fn edit(
        &mut self,
        id: EntryId,
        field: Field,
        text: &str,
    ) -> Result<EditOutcome, EditError> {
        self.ensure_editable()?;
        let controller = self
            .controllers
            .get_mut(&id)
            .ok_or(EditError::UnknownEntry(id))?;
        controller.edit(field, text, &mut self.set, self.cache.snapshot())
    }

    pub fn set_kind(&mut self, id: EntryId, kind: FaultKind) -> Result<EditOutcome, EditError> {
        self.edit(id, Field::Kind, kind.as_str())
    }

    /// Throw away a pending draft of `field`.
    pub fn discard(&mut self, id: EntryId, field: Field) -> Result<(), EditError> {
        let entry = self.set.get(id).ok_or(EditError::UnknownEntry(id))?;
        if let Some(controller) = self.controllers.get_mut(&id) {
            controller.discard(field, entry);
        }
        Ok(())
    }

    pub fn options(&self, id: EntryId, field: Field) -> Result<Vec<String>, EditError> {
        let controller = self.controller(id).ok_or(EditError::UnknownEntry(id))?;
        if !controller.visible_fields().contains(field) {
            return Err(EditError::IrrelevantField {
                field,
                kind: controller.kind(),
            });
        }
        Ok(controller.options(field, self.cache.topology()))
    }

    /// Issues that would block a submission right now, including drafts
    /// that never parsed.
    pub fn issues(&self) -> Vec<EntryIssue> {
        self.set
            .entries()
            .iter()
            .flat_map(|entry| match self.controllers.get(&entry.id) {
                Some(controller) => controller.issues(entry),
                None => validate_entry(entry),
            })
            .collect()
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.refresh_seq += 1;
        self.refresh_pending = true;
        debug!(seq = self.refresh_seq, "topology refresh started");
        RefreshTicket {
            seq: self.refresh_seq,
        }
    }

    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<TopologySnapshot, DiscoveryError>,
    ) -> RefreshOutcome {
        if ticket.seq != self.refresh_seq {
            debug!(
                seq = ticket.seq,
                latest = self.refresh_seq,
                "dropping superseded topology refresh"
            );
            return RefreshOutcome::Superseded;
        }
        self.refresh_pending = false;

        match self.cache.apply_refresh(result) {
            Ok(topology) => {
                let corrected = self.set.on_topology_changed(topology);
                for entry in self.set.entries() {
                    if let Some(controller) = self.controllers.get_mut(&entry.id) {
                        controller.sync(entry);
                    }
                }
                if corrected > 0 {
                    info!("{corrected} entries adjusted to the new topology");
                }
                RefreshOutcome::Applied { corrected }
            }
            Err(error) => RefreshOutcome::Failed(error),
        }
    }

    /// Validate the whole set and lock editing until
    /// [`complete_submit`](Self::complete_submit).
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SubmitError> {
        if self.submitting {
            return Err(SubmitError::Busy);
        }
        let issues = self.issues();
        if !issues.is_empty() {
            return Err(SubmitError::Invalid(issues));
        }
        let batch = BatchSubmitter::prepare(self.set.entries())?;
        self.submitting = true;
        info!("submitting {} fault(s)", batch.len());
        Ok(SubmitTicket { batch })
    }

    pub fn complete_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<SubmitResponse, SubmitError>,
    ) -> &BatchReport {
        self.submitting = false;
        let report = BatchSubmitter::reconcile(&ticket.batch, result);
        self.last_report.insert(report)
    }

    /// Attach a side observation to the last report.
    pub fn add_notice(&mut self, notice: impl Into<String>) {
        if let Some(report) = self.last_report.as_mut() {
            report.notices.push(notice.into());
        }
    }

    fn attach(&mut self, id: EntryId) {
        if let Some(entry) = self.set.get(id) {
            self.controllers.insert(id, ConfigEntryController::new(entry));
        }
    }
}
