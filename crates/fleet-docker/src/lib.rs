//! Docker CLI backends for fleet rollouts.
//!
//! [`DockerStore`] implements the artifact store over `docker images` /
//! `docker build`; [`ComposeRuntime`] implements the process runtime over
//! `docker compose` and `docker ps`. Both shell out to the `docker` binary
//! found on `PATH` (override with `DOCKER_BIN`).

mod command;
pub mod runtime;
pub mod store;

pub use runtime::ComposeRuntime;
pub use store::DockerStore;

/// Docker binary to invoke.
pub fn docker_bin() -> String {
    std::env::var("DOCKER_BIN").unwrap_or_else(|_| "docker".to_string())
}
