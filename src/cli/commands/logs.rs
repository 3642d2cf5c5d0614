//! Logs command - tail app logs until interrupted or the board ends the stream

use anyhow::Result;

use crate::cli::args::Cli;
use crate::cli::commands::CommandContext;
use crate::config::AppConfig;
use crate::services::{Orchestrator, StreamPurpose};

pub async fn execute_logs_command(cli: &Cli, config: AppConfig, id: &str) -> Result<()> {
    let ctx = CommandContext::connect(cli, config).await?;
    let result = ctx.until_interrupted(tail(ctx.orchestrator(), id)).await;
    ctx.shutdown().await;
    result
}

async fn tail(orchestrator: &Orchestrator, id: &str) -> Result<()> {
    println!("📜 Tailing logs of {} (Ctrl+C to stop)", id);
    orchestrator.apps().stream_logs(id, |line| println!("{}", line))?;

    if let Some(closed) = orchestrator.singletons().close_token(StreamPurpose::LogTail) {
        closed.cancelled().await;
        println!("📭 Log stream ended");
    }
    Ok(())
}
