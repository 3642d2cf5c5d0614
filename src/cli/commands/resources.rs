//! Resources command - follow cpu, memory and disk usage

use anyhow::Result;
use serde_json::Value;

use crate::cli::args::Cli;
use crate::cli::commands::CommandContext;
use crate::config::AppConfig;
use crate::models::app::ResourceEvent;
use crate::services::Orchestrator;

pub async fn execute_resources_command(cli: &Cli, config: AppConfig) -> Result<()> {
    let ctx = CommandContext::connect(cli, config).await?;
    let result = ctx.until_interrupted(follow(ctx.orchestrator())).await;
    ctx.shutdown().await;
    result
}

async fn follow(orchestrator: &Orchestrator) -> Result<()> {
    println!("📊 Following board resources (Ctrl+C to stop)");
    let subscription = orchestrator
        .system()
        .stream_resources(|event| println!("{}", format_resource(&event)))?;
    subscription.closed().await;
    Ok(())
}

fn format_resource(event: &ResourceEvent) -> String {
    let detail = match &event.data {
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{}={}", key, s),
                other => format!("{}={}", key, other),
            })
            .collect::<Vec<_>>()
            .join(" "),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("{:<5} {}", event.kind, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::app::ResourceKind;
    use serde_json::json;

    #[test]
    fn test_format_resource_fields() {
        let line = format_resource(&ResourceEvent {
            kind: ResourceKind::Mem,
            data: json!({"total": 2048, "used": 512}),
        });
        assert_eq!(line, "mem   total=2048 used=512");

        let line = format_resource(&ResourceEvent {
            kind: ResourceKind::Cpu,
            data: json!("42%"),
        });
        assert_eq!(line, "cpu   42%");
    }
}
