use std::process::ExitCode;

use anyhow::Context as _;

use crate::output::{self, OutputFormat};

use super::Context;

/// `fleet versions`
pub fn run(ctx: &Context) -> anyhow::Result<ExitCode> {
    let tags = ctx
        .coordinator()
        .tag_set()
        .with_context(|| format!("failed to list versions of {}", ctx.config.app.image))?;

    match ctx.format {
        OutputFormat::Json => {
            let versions: Vec<String> = tags.iter().map(ToString::to_string).collect();
            println!("{}", serde_json::to_string_pretty(&versions)?);
        }
        OutputFormat::Text => print!("{}", output::render_versions(&ctx.config.app.image, &tags)),
    }
    Ok(ExitCode::SUCCESS)
}
