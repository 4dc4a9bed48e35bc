//! HTTP client for the lab's discovery, fault and measurement services.

use std::error::Error as _;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::error::{DiscoveryError, SubmitError};
use crate::protocol::{
    FAULT_BATCH_PATH, FAULT_FLAG_PATH, FaultFlagRequest, FaultPayload, SubmitResponse,
    TOPOLOGY_PATH, error_message, parse_submit_response, parse_topology,
};
use crate::topology::TopologySnapshot;

/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct LabClient {
    http: reqwest::Client,
    base_url: String,
}

impl LabClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("base URL must start with http:// or https://: {base_url}");
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /api/insert/topology`.
    pub async fn fetch_topology(&self) -> Result<TopologySnapshot, DiscoveryError> {
        let url = self.url(TOPOLOGY_PATH);
        debug!(%url, "fetching topology");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Transport(describe(&e)))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| DiscoveryError::Transport(describe(&e)))?;
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        parse_topology(&body)
    }

    /// `POST /api/insert/fault` with the whole ordered batch. No retries.
    pub async fn submit_batch(
        &self,
        payloads: &[FaultPayload],
    ) -> Result<SubmitResponse, SubmitError> {
        let url = self.url(FAULT_BATCH_PATH);
        debug!(%url, items = payloads.len(), "submitting fault batch");
        let resp = self
            .http
            .post(&url)
            .json(payloads)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(describe(&e)))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| SubmitError::Transport(describe(&e)))?;
        if !status.is_success() {
            return Err(SubmitError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        parse_submit_response(&body)
    }

    /// `POST /api/measure/set_fault_flag`. Returns the service's message.
    pub async fn set_fault_flag(&self, is_injected: bool) -> Result<String> {
        let url = self.url(FAULT_FLAG_PATH);
        let resp = self
            .http
            .post(&url)
            .json(&FaultFlagRequest { is_injected })
            .send()
            .await
            .map_err(|e| anyhow::anyhow!(describe(&e)))
            .context("set fault flag")?;
        let status = resp.status();
        let body = resp.bytes().await.context("read fault flag response")?;
        let message = error_message(&body);
        if !status.is_success() {
            bail!("set fault flag: measurement service answered {status}: {message}");
        }
        Ok(message)
    }
}

/// Flatten a reqwest error and its sources into one line.
fn describe(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = LabClient::new(" http://lab:5000/ ", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://lab:5000");
        assert_eq!(
            client.url(TOPOLOGY_PATH),
            "http://lab:5000/api/insert/topology"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(LabClient::new("lab:5000", Duration::from_secs(1)).is_err());
    }
}
