pub mod deploy;
pub mod rollback;
pub mod status;
pub mod versions;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context as _;
use tracing::warn;

use fleet_core::{FleetConfig, RolloutOutcome, TagSet};
use fleet_docker::{ComposeRuntime, DockerStore};
use fleet_health::HttpProber;
use fleet_rollout::{Coordinator, ProcessRuntime, RolloutReport, RolloutResult};

use crate::output::{self, OutputFormat};

pub type FleetCoordinator<'a> = Coordinator<'a, DockerStore, ComposeRuntime, HttpProber>;

/// Loaded configuration plus global flags.
pub struct Context {
    pub config: FleetConfig,
    pub format: OutputFormat,
}

impl Context {
    pub fn load(path: &Path, format: OutputFormat) -> anyhow::Result<Self> {
        let config = FleetConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        Ok(Self { config, format })
    }

    pub fn coordinator(&self) -> FleetCoordinator<'_> {
        let prober = HttpProber::new(self.config.health.path.clone(), self.config.health.timeout());
        Coordinator::new(
            &self.config,
            DockerStore::default(),
            ComposeRuntime::from_config(&self.config),
            prober,
        )
    }
}

/// Which entry point produced a result, for wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deploy,
    Rollback,
}

impl Action {
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Deploy => "Deployed",
            Action::Rollback => "Rolled back to",
        }
    }
}

/// Exit status of a gate verdict: 0 when every robot passed, 1 otherwise.
pub(crate) fn outcome_status(outcome: RolloutOutcome) -> u8 {
    match outcome {
        RolloutOutcome::Success => 0,
        RolloutOutcome::Failed(_) => 1,
    }
}

/// Exit status of a deploy or rollback. Every rollout error is a failure.
pub(crate) fn rollout_status(result: &RolloutResult<RolloutReport>) -> u8 {
    match result {
        Ok(report) => outcome_status(report.outcome()),
        Err(_) => 1,
    }
}

/// Print the result of a deploy or rollback and pick the exit status.
pub(crate) fn finish(
    ctx: &Context,
    coordinator: &FleetCoordinator<'_>,
    action: Action,
    result: RolloutResult<RolloutReport>,
) -> anyhow::Result<ExitCode> {
    let status = rollout_status(&result);
    match &result {
        Err(e) => output::emit_error(ctx.format, action, e),
        Ok(report) if report.outcome().is_success() => {
            output::emit_success(ctx.format, action, report, &ctx.config)?
        }
        Ok(report) => {
            let logs = failing_logs(ctx, coordinator.runtime(), report);
            let tags = coordinator.tag_set().unwrap_or_else(|e| {
                warn!(error = %e, "could not list versions for rollback guidance");
                TagSet::default()
            });
            output::emit_failure(ctx.format, action, report, &ctx.config, &logs, &tags)?;
        }
    }
    Ok(ExitCode::from(status))
}

/// Recent logs of every robot that failed its probe, as (robot id, text).
fn failing_logs<R: ProcessRuntime>(
    ctx: &Context,
    runtime: &R,
    report: &RolloutReport,
) -> Vec<(String, String)> {
    report
        .health
        .failing()
        .filter_map(|failed| {
            let robot = ctx.config.robots.iter().find(|r| r.id == failed.robot_id)?;
            let text = runtime
                .logs(&ctx.config.app.project, robot.service_name())
                .unwrap_or_else(|e| format!("(logs unavailable: {e})"));
            Some((robot.id.clone(), text))
        })
        .collect()
}
