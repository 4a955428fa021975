//! fleet-rollout — version-aware deployment and rollback for the robot fleet.
//!
//! # Components
//!
//! - **`resolver`** — Picks the version to act on (explicit, next patch, or bootstrap)
//! - **`decision`** — Build a new artifact or reuse an existing one
//! - **`selector`** — Picks the rollback target (second-newest by default)
//! - **`coordinator`** — Teardown → port reclaim → build/reuse → start → settle → health gate
//! - **`backend`** — Seams to the artifact store and the process runtime
//!
//! Everything runs sequentially on the caller's task. The only waits are the
//! external build and the fixed settle interval before health verification.

pub mod backend;
pub mod coordinator;
pub mod decision;
pub mod error;
pub mod resolver;
pub mod selector;

pub use backend::{
    ArtifactStore, OwnerKind, ProcessHandle, ProcessRuntime, RunningSet, RuntimeError, StoreError,
};
pub use coordinator::{Coordinator, RolloutReport, SETTLE_INTERVAL};
pub use decision::{BuildAction, decide};
pub use error::{RolloutError, RolloutResult};
pub use resolver::resolve;
pub use selector::select;
