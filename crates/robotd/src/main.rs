use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use robotd::{RobotConfig, RobotState, build_router, config, running_version};

#[derive(Parser)]
#[command(name = "robotd", about = "Robot instance daemon", version)]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value = "8000")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,robotd=debug")),
        )
        .init();

    let cli = Cli::parse();

    let path = config::config_path();
    let robot = RobotConfig::from_file(&path)
        .inspect_err(|e| error!(error = %e, "Failed to initialize robot"))
        .with_context(|| format!("loading {}", path.display()))?;
    let version = running_version();
    info!(
        robot_id = %robot.robot_id,
        sensors = robot.sensors.len(),
        %version,
        "Robot initialized"
    );

    let router = build_router(RobotState::initialized(robot, version));
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));

    info!(%addr, "robotd listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("robotd stopped");
    Ok(())
}
