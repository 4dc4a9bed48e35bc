//! Startup configuration of the console.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::client::LabClient;
use crate::session::SessionStore;

/// Resolved settings, built once from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub session_file: PathBuf,
    pub timeout: Duration,
    /// Post `is_injected: true` to the measurement service after a batch
    /// in which something took effect.
    pub mark_fault_flag: bool,
    pub refresh_on_start: bool,
}

impl ConsoleConfig {
    /// Create config from CLI arguments.
    pub fn from_cli(
        base_url: String,
        session_file: Option<PathBuf>,
        timeout_secs: u64,
        mark_fault_flag: bool,
        no_refresh: bool,
    ) -> Result<Self> {
        if timeout_secs == 0 {
            bail!("--timeout-secs must be at least 1");
        }
        let base_url = base_url.trim().to_string();
        if base_url.is_empty() {
            bail!("--base-url must not be empty");
        }
        Ok(Self {
            base_url,
            session_file: session_file.unwrap_or_else(SessionStore::default_path),
            timeout: Duration::from_secs(timeout_secs),
            mark_fault_flag,
            refresh_on_start: !no_refresh,
        })
    }

    pub fn client(&self) -> Result<LabClient> {
        LabClient::new(&self.base_url, self.timeout)
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(&self.session_file)
    }
}
