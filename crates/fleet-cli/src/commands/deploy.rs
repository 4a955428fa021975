use std::process::ExitCode;

use super::{Action, Context, finish};

/// `fleet deploy [VERSION]`
pub async fn run(ctx: &Context, version: Option<&str>) -> anyhow::Result<ExitCode> {
    let coordinator = ctx.coordinator();
    let result = coordinator.deploy(version).await;
    finish(ctx, &coordinator, Action::Deploy, result)
}
