//! Seams to the systems the orchestrator drives but does not own.
//!
//! The artifact store holds built images addressed by tag; the process
//! runtime starts and stops the managed instance set. Both are injected
//! into the [`Coordinator`](crate::Coordinator) so rollouts can be driven
//! against in-memory fakes.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Errors from the artifact store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to run {command}: {message}")]
    Command { command: String, message: String },

    #[error("build failed: {0}")]
    Build(String),
}

/// Errors from the process runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to run {command}: {message}")]
    Command { command: String, message: String },
}

/// What kind of thing holds a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    /// A container; `id` is the container id.
    Container,
    /// A plain host process; `id` is the pid.
    HostProcess,
}

/// A process (or container) that can be stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessHandle {
    pub id: String,
    /// Human-readable name for logs, if the runtime knows one.
    pub name: Option<String>,
    pub kind: OwnerKind,
}

impl ProcessHandle {
    pub fn container(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
            kind: OwnerKind::Container,
        }
    }

    pub fn host_process(pid: impl Into<String>) -> Self {
        Self {
            id: pid.into(),
            name: None,
            kind: OwnerKind::HostProcess,
        }
    }
}

/// Instances of the managed set observed running at query time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunningSet {
    pub instances: Vec<String>,
}

impl RunningSet {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

/// Stores built artifacts, one per tag.
pub trait ArtifactStore: Send + Sync {
    /// Every tag currently stored under `image`, unfiltered.
    fn list_tags(&self, image: &str) -> Result<Vec<String>, StoreError>;

    /// Whether `image:tag` exists.
    fn exists(&self, image: &str, tag: &str) -> Result<bool, StoreError>;

    /// Build `context` and tag the result with every entry in `tags`.
    ///
    /// Either the build succeeds and all tags exist, or it fails and the
    /// store is unchanged.
    fn build(&self, context: &Path, image: &str, tags: &[String]) -> Result<(), StoreError>;
}

/// Starts, stops and inspects the managed instance set.
pub trait ProcessRuntime: Send + Sync {
    /// Instances of `project` currently running.
    fn running_set(&self, project: &str) -> Result<RunningSet, RuntimeError>;

    /// Stop every instance of `project`. Succeeds when nothing is running.
    fn stop_all(&self, project: &str) -> Result<(), RuntimeError>;

    /// The container or host process currently bound to `port`, if any.
    fn find_owner(&self, port: u16) -> Result<Option<ProcessHandle>, RuntimeError>;

    fn stop(&self, handle: &ProcessHandle) -> Result<(), RuntimeError>;

    /// Start every instance of `project`, passing `version` as configuration.
    fn start_all(&self, project: &str, version: &str) -> Result<(), RuntimeError>;

    /// Recent log output of one instance.
    fn logs(&self, project: &str, service: &str) -> Result<String, RuntimeError>;
}
