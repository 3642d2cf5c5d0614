//! Update command - check for and optionally apply system updates

use anyhow::Result;

use crate::cli::args::Cli;
use crate::cli::commands::CommandContext;
use crate::cli::commands::operation::follow;
use crate::config::AppConfig;
use crate::services::Orchestrator;

pub async fn execute_update_command(
    cli: &Cli,
    config: AppConfig,
    apply: bool,
    only_arduino: bool,
) -> Result<()> {
    let ctx = CommandContext::connect(cli, config).await?;
    let result = ctx
        .until_interrupted(update(ctx.orchestrator(), apply, only_arduino))
        .await;
    ctx.shutdown().await;
    result
}

async fn update(orchestrator: &Orchestrator, apply: bool, only_arduino: bool) -> Result<()> {
    let system = orchestrator.system();
    let info = system.check_updates(only_arduino).await?;
    if !info.available {
        println!("✅ System is up to date");
        return Ok(());
    }

    println!("📦 Updates available:");
    for package in &info.packages {
        println!("  - {}", package);
    }

    if !apply {
        println!("\nRun with --apply to install them");
        return Ok(());
    }

    println!("\n⬇️  Applying updates...");
    let handle = system.apply_updates(only_arduino)?;
    follow(handle, "Applied", "system update").await
}
