//! Health gate: probes the whole fleet once and aggregates a verdict.

use serde::Serialize;
use tracing::{info, warn};

use fleet_core::{RobotConfig, RolloutOutcome};

use crate::checker::{ProbeResult, Prober};

/// Probe result for one robot, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointReport {
    pub robot_id: String,
    pub url: String,
    pub result: ProbeResult,
}

/// Outcome of a full gate pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateReport {
    /// Per-robot results in probe order.
    pub results: Vec<EndpointReport>,
    pub outcome: RolloutOutcome,
}

impl GateReport {
    pub fn failing(&self) -> impl Iterator<Item = &EndpointReport> {
        self.results.iter().filter(|r| !r.result.passed())
    }
}

/// Single-pass health gate over a fixed list of robots.
pub struct HealthGate<P> {
    prober: P,
}

impl<P: Prober> HealthGate<P> {
    pub fn new(prober: P) -> Self {
        Self { prober }
    }

    /// Probe each robot once, sequentially, in the given order.
    pub async fn check(&self, robots: &[RobotConfig]) -> GateReport {
        let mut results = Vec::with_capacity(robots.len());

        for robot in robots {
            let result = self.prober.probe(robot).await;
            if result.passed() {
                info!(robot = %robot.id, url = %robot.url(), "health check passed");
            } else {
                warn!(
                    robot = %robot.id,
                    url = %robot.url(),
                    result = result.label(),
                    "health check failed"
                );
            }
            results.push(EndpointReport {
                robot_id: robot.id.clone(),
                url: robot.url(),
                result,
            });
        }

        let failures = results.iter().filter(|r| !r.result.passed()).count();
        let outcome = RolloutOutcome::from_failures(failures);

        info!(
            total = results.len(),
            failed = failures,
            passed = outcome.is_success(),
            "health gate complete"
        );

        GateReport { results, outcome }
    }
}
