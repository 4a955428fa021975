//! Shared types used across the fleet crates.

use serde::Serialize;

use crate::version::TargetTag;

/// What a single deploy invocation acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentTarget {
    pub tag: TargetTag,
    /// An existing artifact was bound instead of building a new one.
    pub reused: bool,
}

/// Aggregate verdict of one health gate pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "unhealthy", rename_all = "snake_case")]
pub enum RolloutOutcome {
    Success,
    /// Number of instances that failed their probe.
    Failed(usize),
}

impl RolloutOutcome {
    pub fn from_failures(failures: usize) -> Self {
        if failures == 0 {
            RolloutOutcome::Success
        } else {
            RolloutOutcome::Failed(failures)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RolloutOutcome::Success)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            RolloutOutcome::Success => "✓",
            RolloutOutcome::Failed(_) => "✗",
        }
    }
}
