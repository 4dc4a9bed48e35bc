//! Batch submission and per-entry result reconciliation.
//!
//! Results are matched to entries purely by position. A short response
//! leaves the trailing entries `unknown`, and an unreadable answer leaves
//! all of them `unknown`. A request that never got through yields one
//! batch-level failure with no per-item results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::client::LabClient;
use crate::entry::{EntryId, FaultEntry, FaultSpec};
use crate::error::SubmitError;
use crate::kind::FaultKind;
use crate::protocol::{
    FaultPayload, ResultStatus, SubmitResponse, UNKNOWN_RESULT_MESSAGE, build_batch,
};
use crate::topology::split_link_key;
use crate::validate::validate_batch;

/// What was sent, kept to reconcile the response against.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub items: Vec<PreparedItem>,
    pub payloads: Vec<FaultPayload>,
    pub prepared_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PreparedItem {
    pub entry: EntryId,
    pub kind: FaultKind,
    /// Local description used when the service gives none.
    pub target_display: String,
}

impl PreparedBatch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Milliseconds since the batch was prepared.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.prepared_at).num_milliseconds()
    }
}

/// Result for one submitted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemResult {
    pub entry: EntryId,
    /// 1-based position in the submitted batch.
    pub position: usize,
    pub kind: FaultKind,
    pub status: ResultStatus,
    pub message: String,
    pub target_display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Every item reported success.
    Succeeded,
    /// Some items took effect, some did not (or are unknown).
    Partial,
    /// No item took effect.
    Failed,
    /// The request was delivered but no item has a known result.
    Unconfirmed,
    /// The request itself failed; no per-item results exist.
    TransportFailed,
}

impl std::fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BatchOutcome::Succeeded => "succeeded",
            BatchOutcome::Partial => "partially succeeded",
            BatchOutcome::Failed => "failed",
            BatchOutcome::Unconfirmed => "unconfirmed",
            BatchOutcome::TransportFailed => "not delivered",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    /// Batch-level message, verbatim from the service or the transport error.
    pub message: String,
    pub items: Vec<ItemResult>,
    /// Side observations (surplus results, fault flag failures).
    pub notices: Vec<String>,
    pub submitted: usize,
    pub completed_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn count(&self, status: ResultStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    pub fn any_took_effect(&self) -> bool {
        self.items.iter().any(|i| took_effect(i.status))
    }

    pub fn result_for(&self, entry: EntryId) -> Option<&ItemResult> {
        self.items.iter().find(|i| i.entry == entry)
    }
}

/// Success and warning both mean the fault was applied; info is an
/// acknowledgement without failure.
fn took_effect(status: ResultStatus) -> bool {
    matches!(
        status,
        ResultStatus::Success | ResultStatus::Warning | ResultStatus::Info
    )
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BatchSubmitter;

impl BatchSubmitter {
    /// Validate and serialize `entries`. Nothing is sent if this fails.
    pub fn prepare(entries: &[FaultEntry]) -> Result<PreparedBatch, SubmitError> {
        if entries.is_empty() {
            return Err(SubmitError::EmptySet);
        }
        let issues = validate_batch(entries);
        if !issues.is_empty() {
            return Err(SubmitError::Invalid(issues));
        }
        Ok(PreparedBatch {
            items: entries
                .iter()
                .map(|e| PreparedItem {
                    entry: e.id,
                    kind: e.kind(),
                    target_display: describe_target(e),
                })
                .collect(),
            payloads: build_batch(entries),
            prepared_at: Utc::now(),
        })
    }

    /// Map the service's answer back onto the submitted entries.
    pub fn reconcile(
        batch: &PreparedBatch,
        result: Result<SubmitResponse, SubmitError>,
    ) -> BatchReport {
        let response = match result {
            Ok(response) => response,
            // Delivered, but the answer cannot be read: every entry is unknown.
            Err(error @ SubmitError::Malformed(_)) => {
                warn!("fault batch of {} delivered: {}", batch.len(), error);
                SubmitResponse {
                    message: error.to_string(),
                    status: ResultStatus::Unknown,
                    details: Vec::new(),
                }
            }
            Err(error) => {
                warn!(
                    "fault batch of {} not delivered after {}ms: {}",
                    batch.len(),
                    batch.elapsed_ms(),
                    error
                );
                return BatchReport {
                    outcome: BatchOutcome::TransportFailed,
                    message: error.to_string(),
                    items: Vec::new(),
                    notices: Vec::new(),
                    submitted: batch.len(),
                    completed_at: Utc::now(),
                };
            }
        };

        let mut notices = Vec::new();
        if response.details.len() < batch.len() {
            warn!(
                "fault service returned {} results for {} entries",
                response.details.len(),
                batch.len()
            );
            notices.push(format!(
                "{} of {} entries received no result",
                batch.len() - response.details.len(),
                batch.len()
            ));
        } else if response.details.len() > batch.len() {
            warn!(
                "fault service returned {} results for {} entries; extra ignored",
                response.details.len(),
                batch.len()
            );
            notices.push(format!(
                "ignored {} surplus result(s)",
                response.details.len() - batch.len()
            ));
        }

        let mut details = response.details.into_iter();
        let items: Vec<ItemResult> = batch
            .items
            .iter()
            .enumerate()
            .map(|(idx, prepared)| match details.next() {
                Some(detail) => ItemResult {
                    entry: prepared.entry,
                    position: idx + 1,
                    kind: prepared.kind,
                    status: detail.status,
                    message: detail.message,
                    target_display: if detail.target_display.is_empty() {
                        prepared.target_display.clone()
                    } else {
                        detail.target_display
                    },
                },
                None => ItemResult {
                    entry: prepared.entry,
                    position: idx + 1,
                    kind: prepared.kind,
                    status: ResultStatus::Unknown,
                    message: UNKNOWN_RESULT_MESSAGE.to_string(),
                    target_display: prepared.target_display.clone(),
                },
            })
            .collect();

        let succeeded = items.iter().filter(|i| i.status.is_success()).count();
        let outcome = if succeeded == items.len() {
            BatchOutcome::Succeeded
        } else if items.iter().any(|i| took_effect(i.status)) {
            BatchOutcome::Partial
        } else if items.iter().all(|i| i.status == ResultStatus::Unknown) {
            BatchOutcome::Unconfirmed
        } else {
            BatchOutcome::Failed
        };
        info!(
            "fault batch {}: {}/{} succeeded after {}ms",
            outcome,
            succeeded,
            items.len(),
            batch.elapsed_ms()
        );

        BatchReport {
            outcome,
            message: response.message,
            items,
            notices,
            submitted: batch.len(),
            completed_at: Utc::now(),
        }
    }

    /// Prepare, send and reconcile in one step. Local rejections come back
    /// as `Err`; anything that happened after sending is in the report.
    pub async fn submit(
        client: &LabClient,
        entries: &[FaultEntry],
    ) -> Result<BatchReport, SubmitError> {
        let batch = Self::prepare(entries)?;
        let result = client.submit_batch(&batch.payloads).await;
        Ok(Self::reconcile(&batch, result))
    }
}

/// Short description of what an entry targets.
pub fn describe_target(entry: &FaultEntry) -> String {
    let t = &entry.target;
    match &entry.spec {
        FaultSpec::LinkDown | FaultSpec::LinkUp => {
            let node = match split_link_key(&t.link) {
                Some((first, _)) if t.node.is_empty() => first,
                _ => t.node.as_str(),
            };
            format!("link {} interface {} of node {}", t.link, t.interface, node)
        }
        FaultSpec::NodeStop
        | FaultSpec::NodeStart
        | FaultSpec::NodePause
        | FaultSpec::NodeUnpause => format!("node {}", t.node),
        FaultSpec::AddLatency(p) => format!(
            "latency ({}ms) on node {}, interface {}",
            p.latency_ms.unwrap_or_default(),
            t.node,
            t.interface
        ),
        FaultSpec::LimitBandwidth(p) => format!(
            "bandwidth limit ({}kbit) on node {}, interface {}",
            p.rate_kbit.unwrap_or_default(),
            t.node,
            t.interface
        ),
        FaultSpec::TcClear => format!("tc rules on node {}, interface {}", t.node, t.interface),
        FaultSpec::RoutingLoopTimed(p) => format!(
            "routing loop {} <-> {} for {}s",
            p.node1,
            p.node2,
            p.duration_sec.unwrap_or_default()
        ),
    }
}
