use std::process::ExitCode;

use super::{Action, Context, finish};

/// `fleet rollback [VERSION]`
pub async fn run(ctx: &Context, version: Option<&str>) -> anyhow::Result<ExitCode> {
    let coordinator = ctx.coordinator();
    let result = coordinator.rollback(version).await;
    finish(ctx, &coordinator, Action::Rollback, result)
}
