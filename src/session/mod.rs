//! Client session orchestrator.
//!
//! Owns the three concurrent activities of the client: the status poll loop
//! (this module), the verifier draining the engine's result channel
//! ([`cache`]), and the submission pump ([`pump`]). The poll loop drives the
//! engine lifecycle from the coordinator's global run state:
//!
//! ```text
//! NoEngine ──RUNNING/params ok──► EngineStarting ──launched──► EngineRunning
//!    │  ▲                                                        │    │
//!    │  └────────params fetch failed (retry next poll)───────────┘    │ engine
//!    │                                                                │ exited
//!    │◄──────────────────────STOPPED───────────────────────────► Stopped
//! ```

pub mod cache;
pub mod pump;

pub use cache::{PendingCache, Verifier};
pub use pump::{PumpStats, SubmissionPump};

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::{ClientConfig, ComputeConfig};
use crate::engine::{self, CandidateResult, SearchEngine};
use crate::error::ClientError;
use crate::protocol::{Coordinator, JumpTable, ProblemParameters, SessionStatus};

/// Constructor invoked once per engine launch. Defaults to
/// [`engine::build_engine`]; embedders can install their own to control
/// engine creation.
pub type EngineBuilder = Box<
    dyn Fn(
            &ComputeConfig,
            Arc<ProblemParameters>,
            JumpTable,
            mpsc::Sender<CandidateResult>,
        ) -> Result<Arc<dyn SearchEngine>, ClientError>
        + Send
        + Sync,
>;

/// Session State Machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoEngine,
    EngineStarting,
    EngineRunning,
    Stopped,
}

/// Result of one poll cycle, deciding the next delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Sleep the nominal poll period and poll again.
    Continue,
    /// Transport failure; sleep the shorter retry backoff and poll again.
    Retry,
    /// STOPPED observed; the session is over.
    Terminate,
}

/// The single ownership slot for the active engine.
struct EngineHandle {
    engine: Arc<dyn SearchEngine>,
    worker: thread::JoinHandle<()>,
}

pub struct Session<C: Coordinator> {
    problem_id: String,
    config: ClientConfig,
    coordinator: Arc<C>,
    cache: Arc<PendingCache>,
    state: SessionState,
    engine: Option<EngineHandle>,
    engine_builder: EngineBuilder,
    verifier_task: Option<tokio::task::JoinHandle<()>>,
}

impl<C: Coordinator> Session<C> {
    pub fn new(problem_id: String, config: ClientConfig, coordinator: Arc<C>) -> Self {
        Self {
            problem_id,
            config,
            coordinator,
            cache: Arc::new(PendingCache::new()),
            state: SessionState::NoEngine,
            engine: None,
            engine_builder: Box::new(|compute, params, jumps, sender| {
                engine::build_engine(compute, params, jumps, sender)
            }),
            verifier_task: None,
        }
    }

    /// Replace the engine constructor used at launch.
    pub fn with_engine_builder(mut self, builder: EngineBuilder) -> Self {
        self.engine_builder = builder;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether an engine handle currently exists (regardless of liveness).
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Main loop of the session: starts the submission pump once, then polls
    /// the coordinator until it reports STOPPED.
    pub async fn run(mut self) -> Result<(), ClientError> {
        info!("Starting session for problem {}", self.problem_id);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let pump = SubmissionPump::new(
            self.problem_id.clone(),
            self.coordinator.clone(),
            self.cache.clone(),
            self.config.cache.point_cache_size,
        );
        let pump_period = self.config.timing.pump_interval_secs;

        tokio::join!(
            self.poll_loop(&shutdown_tx),
            pump.run(shutdown_rx, pump_period),
        );

        info!("Session for problem {} finished", self.problem_id);
        Ok(())
    }

    async fn poll_loop(&mut self, shutdown: &watch::Sender<bool>) {
        loop {
            match self.poll_once().await {
                PollOutcome::Continue => {
                    tokio::time::sleep(Duration::from_secs(self.config.timing.status_poll_secs))
                        .await;
                }
                PollOutcome::Retry => {
                    tokio::time::sleep(Duration::from_secs(self.config.timing.poll_retry_secs))
                        .await;
                }
                PollOutcome::Terminate => {
                    let _ = shutdown.send(true);
                    break;
                }
            }
        }
    }

    /// One poll cycle: fetch status, apply the state machine transition.
    /// Public so tests can drive the loop without real delays.
    pub async fn poll_once(&mut self) -> PollOutcome {
        info!("Polling coordination server...");
        let status = match self.coordinator.get_status(&self.problem_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Connection error: {}", e);
                warn!(
                    "Retrying in {} seconds...",
                    self.config.timing.poll_retry_secs
                );
                return PollOutcome::Retry;
            }
        };

        debug!("Status = {}", status.code());
        match status {
            SessionStatus::Running => {
                self.ensure_engine().await;
                PollOutcome::Continue
            }
            SessionStatus::Stopped => {
                info!("Stopping");
                self.stop_engine().await;
                self.state = SessionState::Stopped;
                PollOutcome::Terminate
            }
            SessionStatus::Unknown(code) => {
                debug!("Ignoring unrecognized status {}", code);
                PollOutcome::Continue
            }
        }
    }

    /// RUNNING observed: launch the engine if there is none, or relaunch its
    /// blocking run on a fresh thread if it exited abnormally.
    async fn ensure_engine(&mut self) {
        if let Some(handle) = self.engine.as_mut() {
            // worker.is_finished() distinguishes a genuine exit from a run
            // that has not yet flipped its liveness flag after launch.
            if !handle.engine.is_running() && handle.worker.is_finished() {
                warn!("Engine exited unexpectedly, relaunching");
                handle.worker = spawn_engine_thread(handle.engine.clone());
            }
            return;
        }

        if let Err(e) = self.start_engine().await {
            error!("Error starting the search engine: {}", e);
            self.state = SessionState::NoEngine;
        }
    }

    /// First RUNNING observation: fetch parameters + jump table, construct
    /// the configured backend and launch its blocking run.
    async fn start_engine(&mut self) -> Result<(), ClientError> {
        self.state = SessionState::EngineStarting;

        let msg = self.coordinator.get_parameters(&self.problem_id).await?;

        info!("Received parameters from server");
        info!("GF(p) = {}", msg.p);
        info!("y^2 = x^3 + {}x + {}", msg.a, msg.b);
        info!("n = {}", msg.n);
        info!("G = [{}, {}]", msg.gx, msg.gy);
        info!("Q = [{}, {}]", msg.qx, msg.qy);
        info!("{} distinguished bits", msg.d_bits);

        let (params, jumps) = msg.into_problem()?;
        let params = Arc::new(params);

        let (tx, rx) = mpsc::channel(self.config.cache.result_queue_size);
        let engine = (self.engine_builder)(&self.config.compute, params.clone(), jumps, tx)?;

        let verifier = Verifier::new(&params, self.cache.clone());
        self.verifier_task = Some(tokio::spawn(async move { verifier.run(rx).await }));

        let worker = spawn_engine_thread(engine.clone());
        self.engine = Some(EngineHandle { engine, worker });
        self.state = SessionState::EngineRunning;
        Ok(())
    }

    /// STOPPED observed: stop and release the engine, then wait for the
    /// verifier to drain the closed result channel.
    async fn stop_engine(&mut self) {
        if let Some(handle) = self.engine.take() {
            handle.engine.stop();
            // stop() is advisory; the run returns at the next step boundary.
            let _ = tokio::task::spawn_blocking(move || {
                let _ = handle.worker.join();
                drop(handle.engine);
            })
            .await;
        }

        if let Some(task) = self.verifier_task.take() {
            let _ = task.await;
        }
    }
}

fn spawn_engine_thread(engine: Arc<dyn SearchEngine>) -> thread::JoinHandle<()> {
    thread::spawn(move || engine.run())
}
