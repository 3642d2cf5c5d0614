//! Apps command - list apps installed on the board

use anyhow::Result;

use crate::cli::args::Cli;
use crate::cli::commands::CommandContext;
use crate::config::AppConfig;
use crate::models::app::{AppInfo, AppStatus};
use crate::services::Orchestrator;

pub async fn execute_apps_command(
    cli: &Cli,
    config: AppConfig,
    filter: Option<&str>,
    status: Option<&str>,
) -> Result<()> {
    let ctx = CommandContext::connect(cli, config).await?;
    let result = ctx
        .until_interrupted(list(ctx.orchestrator(), filter, status))
        .await;
    ctx.shutdown().await;
    result
}

async fn list(orchestrator: &Orchestrator, filter: Option<&str>, status: Option<&str>) -> Result<()> {
    let apps = orchestrator.apps().list_apps(filter, status).await?;
    if apps.is_empty() {
        println!("⚠️  No apps found");
        return Ok(());
    }

    println!("📋 Apps:");
    for app in &apps {
        println!("{}", format_app(app));
    }
    println!("\nTotal apps: {}", apps.len());
    Ok(())
}

fn status_symbol(status: &AppStatus) -> &'static str {
    match status {
        AppStatus::Running => "🟢",
        AppStatus::Starting | AppStatus::Stopping => "🟡",
        AppStatus::Stopped => "⚪",
        AppStatus::Failed => "🔴",
        AppStatus::Unknown => "❔",
    }
}

fn format_app(app: &AppInfo) -> String {
    let mut line = format!(
        "  {} {} [{}] {:?}",
        status_symbol(&app.status),
        app.name,
        app.id,
        app.status
    );
    if app.default {
        line.push_str(" (default)");
    }
    if app.example {
        line.push_str(" (example)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_app_marks_default() {
        let app = AppInfo {
            id: "blink".to_string(),
            name: "Blink".to_string(),
            description: None,
            icon: None,
            status: AppStatus::Running,
            example: false,
            default: true,
        };
        assert_eq!(format_app(&app), "  🟢 Blink [blink] Running (default)");
    }
}
