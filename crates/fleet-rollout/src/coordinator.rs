//! Rollout coordinator. Drives one deploy or rollback end to end.
//!
//! The only ordering guarantee: teardown always precedes startup, and startup
//! always precedes health verification. A failed health gate leaves the new
//! set running; reverting takes an explicit rollback.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use fleet_core::{DeploymentTarget, FleetConfig, RolloutOutcome, TagSet, TargetTag};
use fleet_health::{GateReport, HealthGate, Prober};

use crate::backend::{ArtifactStore, ProcessRuntime, RunningSet};
use crate::decision::{BuildAction, decide};
use crate::error::{RolloutError, RolloutResult};
use crate::{resolver, selector};

/// Grace period between starting the instances and probing them.
pub const SETTLE_INTERVAL: Duration = Duration::from_secs(10);

/// Alias tagged alongside every freshly built version.
const LATEST_TAG: &str = "latest";

/// What a completed rollout did and how it went.
#[derive(Debug, Clone, Serialize)]
pub struct RolloutReport {
    pub target: DeploymentTarget,
    /// Instances observed running before teardown.
    pub replaced: RunningSet,
    pub health: GateReport,
}

impl RolloutReport {
    pub fn outcome(&self) -> RolloutOutcome {
        self.health.outcome
    }
}

/// Sequential rollout driver over an artifact store, a process runtime and a
/// health prober.
pub struct Coordinator<'a, S, R, P> {
    config: &'a FleetConfig,
    store: S,
    runtime: R,
    gate: HealthGate<P>,
}

impl<'a, S, R, P> Coordinator<'a, S, R, P>
where
    S: ArtifactStore,
    R: ProcessRuntime,
    P: Prober,
{
    pub fn new(config: &'a FleetConfig, store: S, runtime: R, prober: P) -> Self {
        Self {
            config,
            store,
            runtime,
            gate: HealthGate::new(prober),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Well-formed versions currently retained for the app image.
    pub fn tag_set(&self) -> RolloutResult<TagSet> {
        let raw = self.store.list_tags(&self.config.app.image)?;
        let tags = TagSet::from_tags(&raw);
        debug!(
            image = %self.config.app.image,
            listed = raw.len(),
            versions = tags.len(),
            "artifact tags listed"
        );
        Ok(tags)
    }

    /// Deploy `explicit`, or the next patch version when none is given.
    pub async fn deploy(&self, explicit: Option<&str>) -> RolloutResult<RolloutReport> {
        let tags = self.tag_set()?;
        let target = resolver::resolve(explicit, &tags);
        info!(version = %target, explicit = explicit.is_some(), "deploying");
        self.rollout(target, explicit.is_some()).await
    }

    /// Redeploy `explicit`, or the second-newest retained version.
    pub async fn rollback(&self, explicit: Option<&str>) -> RolloutResult<RolloutReport> {
        let tags = self.tag_set()?;
        let image = &self.config.app.image;
        let target = selector::select(explicit, image, &tags, |tag| self.store.exists(image, tag))?;
        info!(version = %target, "rolling back");
        self.rollout(target, true).await
    }

    /// Replace the running set with instances of `tag`, then verify them.
    pub async fn rollout(&self, tag: TargetTag, explicit: bool) -> RolloutResult<RolloutReport> {
        let replaced = self.teardown();
        self.reclaim_ports();

        let target = self.bind_artifact(tag, explicit)?;

        let version = target.tag.to_string();
        info!(%version, project = %self.config.app.project, "starting instances");
        if let Err(e) = self
            .runtime
            .start_all(&self.config.app.project, &version)
        {
            // Not fatal; the health gate reports each robot that failed to come up.
            error!(%version, error = %e, "failed to start instances");
        }

        info!(secs = SETTLE_INTERVAL.as_secs(), "waiting for instances to settle");
        tokio::time::sleep(SETTLE_INTERVAL).await;

        let health = self.verify().await;
        match health.outcome {
            RolloutOutcome::Success => info!(%version, "rollout healthy"),
            RolloutOutcome::Failed(n) => {
                warn!(%version, unhealthy = n, "rollout unhealthy, instances left running")
            }
        }

        Ok(RolloutReport {
            target,
            replaced,
            health,
        })
    }

    /// One health gate pass over every configured robot.
    pub async fn verify(&self) -> GateReport {
        self.gate.check(&self.config.robots).await
    }

    /// Stop whatever is currently running for the project.
    fn teardown(&self) -> RunningSet {
        let project = &self.config.app.project;
        let running = match self.runtime.running_set(project) {
            Ok(set) => set,
            Err(e) => {
                warn!(%project, error = %e, "could not inspect running instances");
                RunningSet::default()
            }
        };

        if running.is_empty() {
            debug!(%project, "no running instances to stop");
        } else {
            info!(%project, count = running.len(), "stopping previous instances");
        }

        if let Err(e) = self.runtime.stop_all(project) {
            warn!(%project, error = %e, "teardown failed");
        }
        running
    }

    /// Stop anything still holding a robot's port.
    fn reclaim_ports(&self) {
        for robot in &self.config.robots {
            match self.runtime.find_owner(robot.port) {
                Ok(Some(owner)) => {
                    info!(robot = %robot.id, port = robot.port, owner = %owner.id, kind = ?owner.kind, "reclaiming port");
                    if let Err(e) = self.runtime.stop(&owner) {
                        warn!(port = robot.port, owner = %owner.id, error = %e, "failed to stop port owner");
                    }
                }
                Ok(None) => debug!(port = robot.port, "port free"),
                Err(e) => warn!(port = robot.port, error = %e, "could not inspect port"),
            }
        }
    }

    /// Build a new artifact for `tag` or bind the existing one.
    fn bind_artifact(&self, tag: TargetTag, explicit: bool) -> RolloutResult<DeploymentTarget> {
        let image = &self.config.app.image;
        let version = tag.to_string();
        let exists = self.store.exists(image, &version)?;

        match decide(&tag, explicit, exists) {
            BuildAction::Reuse => {
                info!(%image, %version, "reusing existing artifact");
                Ok(DeploymentTarget { tag, reused: true })
            }
            BuildAction::Build => {
                info!(%image, %version, context = ?self.config.app.build_context, "building artifact");
                let tags = [version.clone(), LATEST_TAG.to_string()];
                self.store
                    .build(&self.config.app.build_context, image, &tags)
                    .map_err(|source| {
                        error!(%image, %version, error = %source, "build failed");
                        RolloutError::BuildFailed {
                            image: image.clone(),
                            tag: version.clone(),
                            source,
                        }
                    })?;
                Ok(DeploymentTarget { tag, reused: false })
            }
        }
    }
}
