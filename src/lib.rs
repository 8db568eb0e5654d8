//! ECDLP distributed client
//!
//! Client half of a distributed elliptic-curve discrete-log computation:
//! Pollard's-rho-style random walks with distinguished points, coordinated by
//! a central server across many independent clients. The client polls the
//! coordinator for global run state, drives a pluggable search engine,
//! verifies the distinguished points it reports, and submits them in batches
//! with at-least-once delivery.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Client entrypoint
//! ├── config.rs      - Configuration management
//! ├── error.rs       - Typed error taxonomy
//! ├── curve.rs       - Prime-field Weierstrass arithmetic
//! ├── protocol/      - Coordination server protocol
//! │   ├── client.rs     - HTTP coordinator client
//! │   └── types.rs      - Wire types (params, points, status)
//! ├── engine/        - Search engine backends
//! │   └── cpu.rs        - CPU r-adding-walk backend
//! ├── session/       - Orchestrator core
//! │   ├── cache.rs      - Pending cache + result verifier
//! │   └── pump.rs       - Batched submission pump
//! └── bench.rs       - Local benchmark self-test
//! ```

pub mod bench;
pub mod config;
pub mod curve;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod session;

// Re-export main types for convenience
pub use config::ClientConfig;
pub use curve::{Curve, Point};
pub use engine::{Backend, CandidateResult, CpuEngine, SearchEngine};
pub use error::ClientError;
pub use protocol::{
    Coordinator, DistinguishedPoint, HttpCoordinator, JumpEntry, JumpTable, ParamsMessage,
    ProblemParameters, SessionStatus, JUMP_TABLE_SIZE,
};
pub use session::{
    EngineBuilder, PendingCache, PollOutcome, PumpStats, Session, SessionState, SubmissionPump,
    Verifier,
};
