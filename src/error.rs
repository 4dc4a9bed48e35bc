//! Error taxonomy of the console core.
//!
//! Stale topology references are not errors: the resolver corrects them
//! silently. Everything listed here is surfaced to the operator verbatim.

use thiserror::Error;

use crate::entry::EntryId;
use crate::kind::{FaultKind, Field};

/// Topology discovery failed or returned something that is not a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("topology request failed: {0}")]
    Transport(String),
    #[error("topology service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed topology: {0}")]
    Malformed(String),
}

/// One local validation problem on one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryIssue {
    pub entry: EntryId,
    pub field: Field,
    pub reason: String,
}

impl std::fmt::Display for EntryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.entry, self.field, self.reason)
    }
}

/// Submission failures. `EmptySet`, `Invalid` and `Busy` are raised locally
/// before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("nothing to submit: the batch has no entries")]
    EmptySet,
    #[error("batch blocked by {} validation issue(s): {}", .0.len(), join_issues(.0))]
    Invalid(Vec<EntryIssue>),
    #[error("a submission is already in flight")]
    Busy,
    #[error("fault request failed: {0}")]
    Transport(String),
    #[error("fault service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed fault response: {0}")]
    Malformed(String),
}

/// Rejected edit on a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no entry {0}")]
    UnknownEntry(EntryId),
    #[error("{field} does not apply to {kind}")]
    IrrelevantField { field: Field, kind: FaultKind },
    #[error("edits are locked while a submission is in flight")]
    Busy,
}

fn join_issues(issues: &[EntryIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
