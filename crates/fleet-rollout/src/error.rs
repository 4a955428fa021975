//! Error types for deploy and rollback.

use fleet_core::TagSet;
use thiserror::Error;

use crate::backend::{RuntimeError, StoreError};

/// Result type alias for rollout operations.
pub type RolloutResult<T> = Result<T, RolloutError>;

/// Terminal failures of a deploy or rollback invocation.
///
/// A failed health gate is not in here: the new instances keep running and
/// the verdict is reported through [`RolloutOutcome`](fleet_core::RolloutOutcome).
#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("build of {image}:{tag} failed: {source}")]
    BuildFailed {
        image: String,
        tag: String,
        #[source]
        source: StoreError,
    },

    #[error("image {image}:{requested} not found (available: {})", .available.display_list())]
    ImageNotFound {
        image: String,
        requested: String,
        available: TagSet,
    },

    #[error(
        "nothing to roll back to: need at least 2 versions, found {} ({})",
        .available.len(),
        .available.display_list()
    )]
    InsufficientHistory { available: TagSet },

    #[error("artifact store error: {0}")]
    Store(#[from] StoreError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}
