//! Session-scoped persistence of the last discovered topology.
//!
//! Only the topology is persisted. The fault batch never is: every start
//! reseeds one default entry against whatever topology is available.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::protocol::{SESSION_DIR_NAME, SESSION_FORMAT_VERSION};
use crate::topology::TopologySnapshot;

#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    version: u32,
    saved_at: DateTime<Utc>,
    topology: TopologySnapshot,
}

/// Topology restored from the session file.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedTopology {
    pub topology: TopologySnapshot,
    pub saved_at: DateTime<Utc>,
}

/// File-backed session state with explicit load/save/evict.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default session file: `$XDG_RUNTIME_DIR/fault-console/session-<ppid>.json`
    /// (temp dir when no runtime dir is set). Keyed by the parent process so
    /// a restart from the same shell finds it and other shells do not.
    pub fn default_path() -> PathBuf {
        let base = std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        base.join(SESSION_DIR_NAME)
            .join(format!("session-{}.json", session_key()))
    }

    /// Read the persisted topology.
    ///
    /// A missing file is `None`. An unreadable or unrecognised file is
    /// logged and also treated as nothing persisted.
    pub fn load(&self) -> Option<PersistedTopology> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("cannot read session file {}: {}", self.path.display(), e);
                return None;
            }
        };
        let record: SessionRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => {
                warn!("ignoring corrupt session file {}: {}", self.path.display(), e);
                return None;
            }
        };
        if record.version != SESSION_FORMAT_VERSION {
            warn!(
                "ignoring session file {} with version {} (expected {})",
                self.path.display(),
                record.version,
                SESSION_FORMAT_VERSION
            );
            return None;
        }
        debug!(path = %self.path.display(), "session topology loaded");
        Some(PersistedTopology {
            topology: record.topology,
            saved_at: record.saved_at,
        })
    }

    /// Persist `topology`, replacing whatever was stored. Written to a
    /// sibling temp file and renamed into place.
    pub fn save(&self, topology: &TopologySnapshot) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create session dir {}", dir.display()))?;
        }
        let record = SessionRecord {
            version: SESSION_FORMAT_VERSION,
            saved_at: Utc::now(),
            topology: topology.clone(),
        };
        let json = serde_json::to_vec_pretty(&record).context("serialize session record")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("move session file into {}", self.path.display()))?;
        debug!(path = %self.path.display(), "session topology saved");
        Ok(())
    }

    /// Drop the persisted topology. A missing file is fine.
    pub fn evict(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session topology evicted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("remove session file {}", self.path.display()))
            }
        }
    }
}

#[cfg(unix)]
fn session_key() -> String {
    std::os::unix::process::parent_id().to_string()
}

#[cfg(not(unix))]
fn session_key() -> String {
    "default".to_string()
}
