//! Start and stop commands - run an app operation and follow its feedback

use anyhow::{Result, anyhow};

use crate::cli::args::Cli;
use crate::cli::commands::CommandContext;
use crate::config::AppConfig;
use crate::services::{OperationHandle, OperationOutcome, OperationUpdate};

pub async fn execute_start_command(cli: &Cli, config: AppConfig, id: &str) -> Result<()> {
    let ctx = CommandContext::connect(cli, config).await?;
    let result = match ctx.orchestrator().apps().start_app(id) {
        Ok(handle) => ctx.until_interrupted(follow(handle, "Started", id)).await,
        Err(e) => Err(e.into()),
    };
    ctx.shutdown().await;
    result
}

pub async fn execute_stop_command(cli: &Cli, config: AppConfig, id: &str) -> Result<()> {
    let ctx = CommandContext::connect(cli, config).await?;
    let result = match ctx.orchestrator().apps().stop_app(id) {
        Ok(handle) => ctx.until_interrupted(follow(handle, "Stopped", id)).await,
        Err(e) => Err(e.into()),
    };
    ctx.shutdown().await;
    result
}

/// Print operation feedback and turn the outcome into a command result
pub async fn follow(handle: OperationHandle, done: &str, subject: &str) -> Result<()> {
    let outcome = handle.wait_with(print_update).await;
    match outcome {
        OperationOutcome::Succeeded => {
            println!("✅ {} {}", done, subject);
            Ok(())
        }
        OperationOutcome::Failed { code, message } => {
            Err(anyhow!("{} failed [{}]: {}", subject, code, message))
        }
        OperationOutcome::Interrupted(reason) => {
            Err(anyhow!("Lost contact with the board: {}", reason))
        }
    }
}

pub fn print_update(update: OperationUpdate) {
    match update {
        OperationUpdate::Progress(fraction) => println!("⏳ {:>3.0}%", fraction * 100.0),
        OperationUpdate::Message(message) => println!("💬 {}", message),
        OperationUpdate::Log(line) => println!("{}", line),
        OperationUpdate::Restarting(message) => println!("🔄 {}", message),
    }
}
