//! HTTP double of the lab's discovery, fault and measurement services.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::impairment::{FaultRequest, check_targets, plan};
use crate::topology::{LabTopology, WireStyle};

/// How the fault endpoint answers a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behaviour {
    /// One result per fault, in order.
    Echo,
    /// Only the first `n` results.
    Truncate(usize),
    /// All results plus `n` made-up extras.
    Surplus(usize),
    /// Non-2xx with a `{status, message}` body.
    Fail { status: u16, message: String },
    /// 200 with a body that is not JSON.
    Garbage,
}

/// Per-item result, shaped like the real service's `details` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultResult {
    pub fault_type: String,
    pub status: String,
    pub message: String,
    pub target_display: String,
}

#[derive(Debug)]
struct LabState {
    topology: LabTopology,
    style: WireStyle,
    topology_failure: Option<(u16, String)>,
    behaviour: Behaviour,
    /// fault_type -> (status, message) replacing the computed result.
    overrides: HashMap<String, (String, String)>,
    flag_failure: Option<(u16, String)>,
    batches: Vec<Vec<FaultRequest>>,
    flags: Vec<bool>,
    topology_requests: usize,
}

type Shared = Arc<Mutex<LabState>>;

fn lock(state: &Shared) -> MutexGuard<'_, LabState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process lab bound to an ephemeral localhost port. Stops on drop.
pub struct MockLab {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockLab {
    pub async fn start(topology: LabTopology) -> Result<Self> {
        let state: Shared = Arc::new(Mutex::new(LabState {
            topology,
            style: WireStyle::default(),
            topology_failure: None,
            behaviour: Behaviour::Echo,
            overrides: HashMap::new(),
            flag_failure: None,
            batches: Vec::new(),
            flags: Vec::new(),
            topology_requests: 0,
        }));

        let app = Router::new()
            .route("/api/insert/topology", get(topology_handler))
            .route("/api/insert/fault", post(fault_handler))
            .route("/api/measure/set_fault_flag", post(fault_flag_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock lab listener")?;
        let addr = listener.local_addr().context("mock lab address")?;
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("mock lab stopped: {e}");
            }
        });
        debug!(%addr, "mock lab listening");

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_topology(&self, topology: LabTopology) {
        let mut state = lock(&self.state);
        state.topology = topology;
        state.topology_failure = None;
    }

    pub fn set_wire_style(&self, style: WireStyle) {
        lock(&self.state).style = style;
    }

    /// Make discovery answer `status` until the next [`set_topology`](Self::set_topology).
    pub fn fail_topology(&self, status: u16, message: &str) {
        lock(&self.state).topology_failure = Some((status, message.to_string()));
    }

    pub fn set_behaviour(&self, behaviour: Behaviour) {
        lock(&self.state).behaviour = behaviour;
    }

    /// Force the result of every fault of `fault_type`.
    pub fn set_status_for(&self, fault_type: &str, status: &str, message: &str) {
        lock(&self.state).overrides.insert(
            fault_type.to_string(),
            (status.to_string(), message.to_string()),
        );
    }

    pub fn fail_fault_flag(&self, status: u16, message: &str) {
        lock(&self.state).flag_failure = Some((status, message.to_string()));
    }

    /// Every batch received, in arrival order.
    pub fn batches(&self) -> Vec<Vec<FaultRequest>> {
        lock(&self.state).batches.clone()
    }

    pub fn flags(&self) -> Vec<bool> {
        lock(&self.state).flags.clone()
    }

    pub fn topology_requests(&self) -> usize {
        lock(&self.state).topology_requests
    }
}

impl Drop for MockLab {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn error_response(status: u16, message: &str) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(json!({ "status": "error", "message": message }))).into_response()
}

async fn topology_handler(State(state): State<Shared>) -> Response {
    let mut state = lock(&state);
    state.topology_requests += 1;
    if let Some((status, message)) = &state.topology_failure {
        return error_response(*status, message);
    }
    Json(state.topology.to_json(state.style)).into_response()
}

fn execute(req: &FaultRequest, state: &LabState) -> FaultResult {
    let outcome = plan(req).and_then(|p| check_targets(req, &state.topology).map(|()| p));
    let mut result = match outcome {
        Ok(p) => FaultResult {
            fault_type: req.fault_type.clone(),
            status: "success".into(),
            message: format!(
                "Successfully executed {} on {}. Output: {}",
                req.fault_type,
                p.target_display,
                p.script()
            ),
            target_display: p.target_display,
        },
        Err(message) => FaultResult {
            fault_type: req.fault_type.clone(),
            status: "error".into(),
            message,
            target_display: String::new(),
        },
    };
    if let Some((status, message)) = state.overrides.get(&req.fault_type) {
        result.status = status.clone();
        result.message = message.clone();
    }
    result
}

async fn fault_handler(
    State(state): State<Shared>,
    Json(batch): Json<Vec<FaultRequest>>,
) -> Response {
    let mut state = lock(&state);
    state.batches.push(batch.clone());

    let mut details: Vec<FaultResult> = batch.iter().map(|req| execute(req, &state)).collect();
    match state.behaviour.clone() {
        Behaviour::Echo => {}
        Behaviour::Truncate(n) => details.truncate(n),
        Behaviour::Surplus(n) => {
            for i in 0..n {
                details.push(FaultResult {
                    fault_type: "unknown".into(),
                    status: "info".into(),
                    message: format!("extra result {i}"),
                    target_display: String::new(),
                });
            }
        }
        Behaviour::Fail { status, message } => return error_response(status, &message),
        Behaviour::Garbage => return (StatusCode::OK, "<html>oops</html>").into_response(),
    }

    let ok = details.iter().filter(|d| d.status == "success").count();
    let status = if ok == batch.len() {
        "success"
    } else if ok == 0 {
        "error"
    } else {
        "warning"
    };
    Json(json!({
        "status": status,
        "message": format!("{ok}/{} faults applied", batch.len()),
        "details": details,
    }))
    .into_response()
}

async fn fault_flag_handler(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    if let Some((status, message)) = &state.flag_failure {
        return error_response(*status, message);
    }
    let Some(is_injected) = body.get("is_injected").and_then(Value::as_bool) else {
        return error_response(400, "is_injected must be a boolean");
    };
    state.flags.push(is_injected);
    Json(json!({ "status": "success", "message": format!("fault flag set to {is_injected}") }))
        .into_response()
}
