//! Search engine backends.
//!
//! The orchestrator consumes the engine only through the [`SearchEngine`]
//! lifecycle contract; the walk implementation, its parallel decomposition
//! and its result delivery channel live behind it. The backend is selected
//! once at startup from configuration.

pub mod cpu;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::ComputeConfig;
use crate::error::ClientError;
use crate::protocol::{JumpTable, ProblemParameters};

pub use cpu::CpuEngine;

/// Compute backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Cpu,
    Gpu,
}

impl FromStr for Backend {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Backend::Cpu),
            "gpu" => Ok(Backend::Gpu),
            other => Err(ClientError::Configuration(format!(
                "unknown backend: {other}"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Cpu => write!(f, "cpu"),
            Backend::Gpu => write!(f, "gpu"),
        }
    }
}

/// One engine result: a walk that reached a distinguished point.
///
/// The walk's starting point is a·G + b·Q; (x, y) is the endpoint after
/// `length` steps. Unverified until the session's verifier accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateResult {
    pub a: BigUint,
    pub b: BigUint,
    pub x: BigUint,
    pub y: BigUint,
    pub length: u64,
}

/// Lifecycle contract for a search backend.
///
/// `run` blocks until `stop` is requested or the engine exits abnormally, so
/// the orchestrator launches it on a dedicated thread. `stop` is advisory:
/// workers observe it at their next step boundary.
pub trait SearchEngine: Send + Sync {
    /// Perform the randomized search, delivering every distinguished point
    /// found over the engine's result channel. Blocking.
    fn run(&self);

    /// Request termination; `run` returns soon afterward.
    fn stop(&self);

    /// Non-blocking liveness query.
    fn is_running(&self) -> bool;
}

/// Startup check that the configured backend is usable at all, before the
/// client contacts the server. The CPU backend only needs a sane thread
/// configuration; the GPU backend needs device support this binary does not
/// carry.
pub fn preflight(compute: &ComputeConfig) -> Result<(), ClientError> {
    match compute.backend {
        Backend::Cpu => {
            if compute.threads == 0 {
                return Err(ClientError::Configuration(
                    "CPU backend requires at least one thread".to_string(),
                ));
            }
            Ok(())
        }
        Backend::Gpu => Err(ClientError::Configuration(
            "no usable compute device: GPU support is not built into this binary".to_string(),
        )),
    }
}

/// Construct the configured backend. This is the engine's one-time setup;
/// invalid device or thread configuration fails here, before any search
/// starts.
pub fn build_engine(
    compute: &ComputeConfig,
    params: Arc<ProblemParameters>,
    jumps: JumpTable,
    sender: mpsc::Sender<CandidateResult>,
) -> Result<Arc<dyn SearchEngine>, ClientError> {
    match compute.backend {
        Backend::Cpu => {
            let engine = CpuEngine::new(
                compute.threads,
                compute.points_per_thread,
                params,
                jumps,
                sender,
            )?;
            Ok(Arc::new(engine))
        }
        Backend::Gpu => Err(ClientError::Configuration(
            "no usable compute device: GPU support is not built into this binary".to_string(),
        )),
    }
}
