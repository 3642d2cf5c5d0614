//! Status command - connect and report what the board runs

use anyhow::Result;

use crate::cli::args::Cli;
use crate::cli::commands::CommandContext;
use crate::config::AppConfig;
use crate::services::Orchestrator;

pub async fn execute_status_command(cli: &Cli, config: AppConfig) -> Result<()> {
    let ctx = CommandContext::connect(cli, config).await?;
    let result = ctx.until_interrupted(report(ctx.orchestrator())).await;
    ctx.shutdown().await;
    result
}

async fn report(orchestrator: &Orchestrator) -> Result<()> {
    let snapshot = orchestrator.session().snapshot();
    println!("📡 State:        {:?}", snapshot.state);
    if let Some(url) = &snapshot.base_url {
        println!("🌐 Orchestrator: {}", url);
    }
    if let Some(port) = snapshot.tunnel_port {
        println!("🔀 Tunnel:       localhost:{}", port);
    }

    let system = orchestrator.system();
    let version = system.version().await?;
    println!("🏷️  Board:        {}", system.board_name().await);
    match &version.build {
        Some(build) => println!("📦 Version:      {} ({})", version.version, build),
        None => println!("📦 Version:      {}", version.version),
    }
    Ok(())
}
