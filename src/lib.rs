//! Fault Console Library
//!
//! Operator-side core of a network-lab fault injector: topology discovery and
//! session caching, an ordered batch of typed fault entries kept consistent
//! with the current topology, local validation, and batch submission with
//! per-entry result reconciliation.

// Use mimalloc as the global allocator for tests (non-Windows only)
#[cfg(not(windows))]
#[cfg(test)]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod cache;
pub mod client;
pub mod commands;
pub mod config;
pub mod config_set;
pub mod console;
pub mod controller;
pub mod entry;
pub mod error;
pub mod kind;
pub mod protocol;
pub mod render;
pub mod resolver;
pub mod session;
pub mod submitter;
pub mod topology;
pub mod validate;
pub mod workbench;

#[cfg(test)]
pub mod tests;

// Re-export commonly used items
pub use cache::{CacheStatus, TopologyCache};
pub use client::LabClient;
pub use config_set::FaultConfigSet;
pub use controller::{ConfigEntryController, EditOutcome};
pub use entry::{EntryId, FaultEntry, FaultSpec, FieldUpdate, Targets};
pub use error::{DiscoveryError, EditError, EntryIssue, SubmitError};
pub use kind::{FaultKind, Field, FieldSet};
pub use session::SessionStore;
pub use submitter::{BatchOutcome, BatchReport, BatchSubmitter, ItemResult};
pub use topology::{Link, TopologySnapshot};
pub use workbench::{RefreshOutcome, Workbench};
