//! Topology cache: the last discovered snapshot plus its freshness.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::client::LabClient;
use crate::error::DiscoveryError;
use crate::session::SessionStore;
use crate::topology::TopologySnapshot;

static EMPTY_TOPOLOGY: LazyLock<TopologySnapshot> = LazyLock::new(TopologySnapshot::empty);

/// Where the current snapshot came from.
#[derive(Clone, Debug, PartialEq)]
pub enum CacheStatus {
    /// No live refresh has succeeded this session. `seeded_at` is set when a
    /// snapshot from an earlier run is being shown.
    NotFetched { seeded_at: Option<DateTime<Utc>> },
    /// Replaced by a successful refresh during this session.
    Fresh { fetched_at: DateTime<Utc> },
    /// The last refresh failed; the snapshot was cleared.
    Failed { error: DiscoveryError },
}

/// Owns the topology snapshot and its session persistence.
///
/// A refresh either replaces the snapshot wholesale or clears it; nothing is
/// ever merged.
#[derive(Debug)]
pub struct TopologyCache {
    store: Option<SessionStore>,
    snapshot: Option<TopologySnapshot>,
    status: CacheStatus,
}

impl TopologyCache {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store: Some(store),
            snapshot: None,
            status: CacheStatus::NotFetched { seeded_at: None },
        }
    }

    /// Cache without persistence.
    pub fn in_memory() -> Self {
        Self {
            store: None,
            snapshot: None,
            status: CacheStatus::NotFetched { seeded_at: None },
        }
    }

    /// Seed from the session file. The seed is never considered fresh.
    /// Returns true when a snapshot was restored.
    pub fn load(&mut self) -> bool {
        let Some(persisted) = self.store.as_ref().and_then(SessionStore::load) else {
            return false;
        };
        info!(
            "restored topology from session ({}), saved {}",
            persisted.topology.summary(),
            persisted.saved_at.to_rfc3339()
        );
        self.snapshot = Some(persisted.topology);
        self.status = CacheStatus::NotFetched {
            seeded_at: Some(persisted.saved_at),
        };
        true
    }

    pub fn snapshot(&self) -> Option<&TopologySnapshot> {
        self.snapshot.as_ref()
    }

    /// Snapshot, or the empty topology when there is none.
    pub fn topology(&self) -> &TopologySnapshot {
        self.snapshot
            .as_ref()
            .unwrap_or(LazyLock::force(&EMPTY_TOPOLOGY))
    }

    pub fn status(&self) -> &CacheStatus {
        &self.status
    }

    /// True once a live refresh has succeeded this session.
    pub fn is_fresh(&self) -> bool {
        matches!(self.status, CacheStatus::Fresh { .. })
    }

    /// Apply the outcome of a discovery fetch.
    pub fn apply_refresh(
        &mut self,
        result: Result<TopologySnapshot, DiscoveryError>,
    ) -> Result<&TopologySnapshot, DiscoveryError> {
        match result {
            Ok(topology) => {
                if let Some(store) = &self.store
                    && let Err(e) = store.save(&topology)
                {
                    warn!("topology not persisted: {e:#}");
                }
                info!("topology refreshed: {}", topology.summary());
                self.status = CacheStatus::Fresh {
                    fetched_at: Utc::now(),
                };
                let snapshot: &TopologySnapshot = self.snapshot.insert(topology);
                Ok(snapshot)
            }
            Err(error) => {
                warn!("{error}");
                self.snapshot = None;
                if let Some(store) = &self.store
                    && let Err(e) = store.evict()
                {
                    warn!("stale session topology not evicted: {e:#}");
                }
                self.status = CacheStatus::Failed {
                    error: error.clone(),
                };
                Err(error)
            }
        }
    }

    /// Fetch and apply in one step.
    pub async fn refresh(
        &mut self,
        client: &LabClient,
    ) -> Result<&TopologySnapshot, DiscoveryError> {
        let result = client.fetch_topology().await;
        self.apply_refresh(result)
    }
}
