//! Lab simulation for integration testing of the fault console.
//!
//! Stands in for the discovery, fault and measurement services of a
//! container network lab without running any containers.
//!
//! # Modules
//!
//! - [`topology`]: Ordered lab topologies and fixtures
//! - [`impairment`]: The commands a real lab would run per fault
//! - [`scenario`]: Deterministic seeded topology churn
//! - [`service`]: axum-based HTTP double of the lab services

pub mod impairment;
pub mod scenario;
pub mod service;
pub mod topology;

pub use impairment::{ExecutionPlan, FaultRequest, check_targets, plan};
pub use scenario::{ChurnConfig, TopologyChurn};
pub use service::{Behaviour, FaultResult, MockLab};
pub use topology::{LabNode, LabTopology, WireStyle, line, ring, two_routers};
