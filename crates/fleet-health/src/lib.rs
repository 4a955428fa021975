//! fleet-health — the health gate that decides whether a rollout took.
//!
//! Every configured robot is probed exactly once, in configuration order,
//! and the per-robot results are folded into a single [`RolloutOutcome`].
//!
//! # Architecture
//!
//! ```text
//! HealthGate<P: Prober>
//!   ├── for each RobotConfig (sequential)
//!   │   └── Prober::probe() → ProbeResult
//!   └── GateReport { results, outcome }
//! ```
//!
//! There is no retry and no backoff here: a single connection failure,
//! timeout, or non-2xx response marks the robot as failing.
//!
//! [`RolloutOutcome`]: fleet_core::RolloutOutcome

pub mod checker;
pub mod gate;

pub use checker::{HttpProber, ProbeFuture, ProbeResult, Prober, http_probe};
pub use gate::{EndpointReport, GateReport, HealthGate};
