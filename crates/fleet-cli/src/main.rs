use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "fleet",
    about = "Versioned deploys and rollbacks for the robot fleet",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to fleet.toml
    #[arg(short, long, global = true, default_value = "fleet.toml")]
    config: PathBuf,

    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or reuse) a version, roll it out to every robot, and verify health.
    ///
    /// Without VERSION the newest retained version's patch is bumped
    /// (v1.0.0 when nothing has been built yet). An explicit VERSION that
    /// already exists is redeployed as-is.
    Deploy {
        /// Version to deploy, e.g. v1.2.3
        version: Option<String>,
    },
    /// Redeploy a previously built version.
    ///
    /// Without VERSION the second-newest retained version is used.
    Rollback {
        /// Version to roll back to, e.g. v1.2.2
        version: Option<String>,
    },
    /// List retained versions, newest first.
    Versions,
    /// Probe every robot once without deploying.
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fleet=info".parse()?)
        )
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context::load(&cli.config, cli.format)?;

    match cli.command {
        Commands::Deploy { version } => commands::deploy::run(&ctx, version.as_deref()).await,
        Commands::Rollback { version } => commands::rollback::run(&ctx, version.as_deref()).await,
        Commands::Versions => commands::versions::run(&ctx),
        Commands::Status => commands::status::run(&ctx).await,
    }
}
