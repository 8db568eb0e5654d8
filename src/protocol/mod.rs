//! Coordination server protocol.
//!
//! Communication between the client and the central run coordinator:
//! - Run status polling (server → client)
//! - Problem parameter + jump table fetch (server → client)
//! - Distinguished point submission (client → server)
//!
//! ```text
//! ┌──────────────────┐
//! │   Coordinator    │
//! │  (run server)    │
//! └────────┬─────────┘
//!          │ HTTP/JSON
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ HttpCoordinator  │────►│ Session          │
//! │ (this module)    │     │ (orchestrator)   │
//! └──────────────────┘     └──────────────────┘
//! ```

pub mod client;
pub mod types;

pub use client::{Coordinator, HttpCoordinator};
pub use types::{
    DistinguishedPoint, JumpEntry, JumpTable, ParamsMessage, ProblemParameters, SessionStatus,
    JUMP_TABLE_SIZE,
};
