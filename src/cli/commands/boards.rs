//! Boards command implementation - List boards found by discovery

use anyhow::{Result, anyhow};
use log::info;

use crate::board::BoardRegistry;
use crate::config::AppConfig;

/// Execute the boards command to list discovered boards
pub async fn execute_boards_command(config: &AppConfig, all: bool) -> Result<()> {
    let registry = BoardRegistry::from_config(config);
    if !registry.check_cli_installed().await {
        return Err(anyhow!(
            "'{}' is not available. Install arduino-cli or set arduino_cli_path in the config",
            config.arduino_cli_path
        ));
    }

    info!("Scanning for boards matching {}...", registry.target_fqbn());
    let detected = registry.discover().await;
    let boards = if all {
        detected
    } else {
        registry.filter_supported(detected)
    };

    if boards.is_empty() {
        println!("⚠️  No supported boards detected");
        return Ok(());
    }

    println!("🔍 Detected Boards:");
    println!("==================\n");

    for board in &boards {
        println!("Board: {}", board.label());
        println!("  Address:   {}", board.address());
        println!("  Transport: {}", board.transport());
        if let Some(serial) = board.hardware_id() {
            println!("  Serial:    {}", serial);
        }
        if board.matches_fqbn(registry.target_fqbn()) {
            println!("  ✅ Supported");
        }
        println!();
    }

    println!("Total boards: {}", boards.len());
    Ok(())
}
