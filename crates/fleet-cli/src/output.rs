//! Human and JSON rendering of rollout results.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde_json::json;

use fleet_core::{FleetConfig, RolloutOutcome, TagSet, TargetTag};
use fleet_health::GateReport;
use fleet_rollout::{RolloutError, RolloutReport};

use crate::commands::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn emit_success(
    format: OutputFormat,
    action: Action,
    report: &RolloutReport,
    config: &FleetConfig,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report_json(report, config, &[]))?),
        OutputFormat::Text => print!("{}", render_success(action, report, config)),
    }
    Ok(())
}

pub fn emit_failure(
    format: OutputFormat,
    action: Action,
    report: &RolloutReport,
    config: &FleetConfig,
    logs: &[(String, String)],
    tags: &TagSet,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report_json(report, config, logs))?),
        OutputFormat::Text => print!("{}", render_failure(action, report, logs, tags)),
    }
    Ok(())
}

pub fn emit_error(format: OutputFormat, action: Action, err: &RolloutError) {
    match format {
        OutputFormat::Json => {
            let available: Vec<String> = match err {
                RolloutError::ImageNotFound { available, .. }
                | RolloutError::InsufficientHistory { available } => {
                    available.iter().map(ToString::to_string).collect()
                }
                _ => Vec::new(),
            };
            let body = json!({
                "success": false,
                "error": err.to_string(),
                "available": available,
            });
            println!("{body:#}");
        }
        OutputFormat::Text => eprint!("{}", render_error(action, err)),
    }
}

fn report_json(
    report: &RolloutReport,
    config: &FleetConfig,
    logs: &[(String, String)],
) -> serde_json::Value {
    let logs: serde_json::Map<String, serde_json::Value> = logs
        .iter()
        .map(|(id, text)| (id.clone(), json!(text)))
        .collect();
    json!({
        "success": report.outcome().is_success(),
        "version": report.target.tag,
        "reused": report.target.reused,
        "outcome": report.outcome(),
        "robots": report.health.results,
        "network": config.network,
        "monitoring": config.monitoring,
        "logs": logs,
    })
}

/// One line per robot: id, url, probe result.
pub fn render_gate(report: &GateReport) -> String {
    let width = report
        .results
        .iter()
        .map(|r| r.robot_id.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for r in &report.results {
        let mark = if r.result.passed() { "✓" } else { "✗" };
        let _ = writeln!(
            out,
            "  {mark} {:<width$}  {}  {}",
            r.robot_id,
            r.url,
            r.result.label()
        );
    }
    let healthy = report.results.iter().filter(|r| r.result.passed()).count();
    let _ = writeln!(
        out,
        "{} {healthy}/{} robots healthy",
        report.outcome.symbol(),
        report.results.len()
    );
    out
}

pub fn render_success(action: Action, report: &RolloutReport, config: &FleetConfig) -> String {
    let mut out = String::new();
    let how = if report.target.reused {
        "existing image"
    } else {
        "new build"
    };
    let _ = writeln!(out, "✓ {} {} ({how})", action.verb(), report.target.tag);
    out.push_str(&render_gate(&report.health));

    let _ = match &config.network.subnet {
        Some(subnet) => writeln!(out, "  Network:    {} ({subnet})", config.network.name),
        None => writeln!(out, "  Network:    {}", config.network.name),
    };
    if config.monitoring.enabled {
        if let Some(url) = &config.monitoring.grafana_url {
            let _ = writeln!(out, "  Grafana:    {url}");
        }
        if let Some(url) = &config.monitoring.prometheus_url {
            let _ = writeln!(out, "  Prometheus: {url}");
        }
    }
    out
}

pub fn render_failure(
    action: Action,
    report: &RolloutReport,
    logs: &[(String, String)],
    tags: &TagSet,
) -> String {
    let mut out = String::new();
    let failed = match report.outcome() {
        RolloutOutcome::Failed(n) => n,
        RolloutOutcome::Success => 0,
    };
    let what = match action {
        Action::Deploy => "Deployment of",
        Action::Rollback => "Rollback to",
    };
    let _ = writeln!(
        out,
        "✗ {what} {} is unhealthy: {failed} of {} robots failed health checks",
        report.target.tag,
        report.health.results.len()
    );
    out.push_str(&render_gate(&report.health));

    for (robot, text) in logs {
        let _ = writeln!(out, "\n--- {robot} logs ---");
        out.push_str(text.trim_end());
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "\nThe new instances are still running at {}.",
        report.target.tag
    );
    out.push_str(&rollback_guidance(&report.target.tag, tags));
    out
}

/// Suggest how to get back to a known version from `deployed`.
pub fn rollback_guidance(deployed: &TargetTag, tags: &TagSet) -> String {
    let deployed = deployed.as_version();
    let candidate = tags.iter().find(|v| Some(**v) != deployed);

    let mut out = String::new();
    match candidate {
        Some(previous) => {
            let _ = writeln!(out, "To roll back:");
            if tags.previous() == Some(*previous) && tags.latest() == deployed {
                let _ = writeln!(out, "  fleet rollback            # redeploys {previous}");
            }
            let _ = writeln!(out, "  fleet rollback {previous}");
            let _ = writeln!(out, "Available versions: {}", tags.display_list());
        }
        None => {
            let _ = writeln!(
                out,
                "No other version is available to roll back to; fix the build and run `fleet deploy`."
            );
        }
    }
    out
}

pub fn render_error(action: Action, err: &RolloutError) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "✗ {err}");
    match err {
        RolloutError::BuildFailed { .. } => {
            let _ = writeln!(
                out,
                "No new instances were started. The previous instances were already stopped,\n\
                 so the fleet may be down. Fix the build and run `fleet deploy` again,\n\
                 or redeploy an existing version with `fleet rollback`."
            );
        }
        RolloutError::ImageNotFound { available, .. } => {
            let _ = writeln!(out, "Available versions: {}", available.display_list());
            if let Some(latest) = available.latest() {
                let cmd = match action {
                    Action::Deploy => "deploy",
                    Action::Rollback => "rollback",
                };
                let _ = writeln!(out, "Pick one, e.g. `fleet {cmd} {latest}`.");
            }
        }
        RolloutError::InsufficientHistory { available } => {
            let _ = writeln!(out, "Available versions: {}", available.display_list());
            let _ = writeln!(out, "Deploy a new version with `fleet deploy` first.");
        }
        RolloutError::Store(_) | RolloutError::Runtime(_) => {
            let _ = writeln!(out, "Check that docker is running and reachable, then retry.");
        }
    }
    out
}

pub fn render_versions(image: &str, tags: &TagSet) -> String {
    if tags.is_empty() {
        return format!("No versions of {image} found. Run `fleet deploy` to build v1.0.0.\n");
    }
    let mut out = String::new();
    for (i, v) in tags.iter().enumerate() {
        let note = match i {
            0 => "  (latest)",
            1 => "  (default rollback target)",
            _ => "",
        };
        let _ = writeln!(out, "{image}:{v}{note}");
    }
    out
}
