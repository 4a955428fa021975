//! robotd — the process that runs on each robot.
//!
//! Exposes the endpoints the fleet CLI probes after a rollout.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/health` | 200 once the robot is initialized, 503 before |
//! | GET | `/status` | Robot id, sensors and running version |
//! | GET | `/` | Banner with robot id and lifecycle state |

pub mod config;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

pub use config::{ConfigError, RobotConfig};

/// Environment key the deployer sets to the rolled-out version.
pub const VERSION_ENV: &str = "APP_VERSION";

/// Shared state for handlers.
#[derive(Debug, Clone)]
pub struct RobotState {
    /// `None` until the configuration has been loaded.
    pub robot: Option<Arc<RobotConfig>>,
    pub version: String,
}

impl RobotState {
    pub fn initialized(robot: RobotConfig, version: impl Into<String>) -> Self {
        Self {
            robot: Some(Arc::new(robot)),
            version: version.into(),
        }
    }

    pub fn uninitialized(version: impl Into<String>) -> Self {
        Self {
            robot: None,
            version: version.into(),
        }
    }
}

/// Version reported by the endpoints, from `APP_VERSION`.
pub fn running_version() -> String {
    std::env::var(VERSION_ENV).unwrap_or_else(|_| "unknown".to_string())
}

pub fn build_router(state: RobotState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .with_state(state)
}
