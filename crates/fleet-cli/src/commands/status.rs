use std::process::ExitCode;

use crate::output::{self, OutputFormat};

use super::Context;

/// `fleet status`: one health gate pass without a rollout.
pub async fn run(ctx: &Context) -> anyhow::Result<ExitCode> {
    let report = ctx.coordinator().verify().await;

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", output::render_gate(&report)),
    }

    Ok(ExitCode::from(super::outcome_status(report.outcome)))
}
