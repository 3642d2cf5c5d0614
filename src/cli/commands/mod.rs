//! CLI command implementations

pub mod apps;
pub mod boards;
pub mod logs;
pub mod operation;
pub mod resources;
pub mod status;
pub mod update;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use log::{info, warn};

use crate::board::BoardRegistry;
use crate::cli::args::{Cli, Commands};
use crate::config::AppConfig;
use crate::models::board::BoardCandidate;
use crate::services::Orchestrator;
use crate::session::ConnectionSession;

/// Execute a CLI command
pub async fn execute_command(command: Commands, cli: &Cli, config: AppConfig) -> Result<()> {
    match command {
        Commands::Boards { all } => boards::execute_boards_command(&config, all).await,
        Commands::Status => status::execute_status_command(cli, config).await,
        Commands::Apps { filter, status } => {
            apps::execute_apps_command(cli, config, filter.as_deref(), status.as_deref()).await
        }
        Commands::Start { id } => operation::execute_start_command(cli, config, &id).await,
        Commands::Stop { id } => operation::execute_stop_command(cli, config, &id).await,
        Commands::Logs { id } => logs::execute_logs_command(cli, config, &id).await,
        Commands::Resources => resources::execute_resources_command(cli, config).await,
        Commands::Update {
            apply,
            only_arduino,
        } => update::execute_update_command(cli, config, apply, only_arduino).await,
    }
}

/// A connected session shared by the board-facing commands
pub struct CommandContext {
    config: AppConfig,
    orchestrator: Orchestrator,
}

impl CommandContext {
    /// Select a board (explicit `--address` or discovery) and connect to it
    pub async fn connect(cli: &Cli, config: AppConfig) -> Result<Self> {
        let board = select_board(cli, &config).await?;
        let session = Arc::new(ConnectionSession::from_config(&config));
        let orchestrator = Orchestrator::new(session.clone(), config.request_timeout());

        println!("🔌 Connecting to {} ({})", board.label(), board.description());
        session.connect(board, cli.password.clone()).await?;
        if let Some(url) = session.base_url() {
            info!("Orchestrator reachable at {}", url);
        }

        Ok(Self {
            config,
            orchestrator,
        })
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Drive `work` to completion unless Ctrl+C arrives first
    pub async fn until_interrupted<F>(&self, work: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        tokio::select! {
            result = work => result,
            _ = tokio::signal::ctrl_c() => {
                println!("\n🛑 Interrupted");
                Ok(())
            }
        }
    }

    /// Close streams and tear down the tunnel
    pub async fn shutdown(self) {
        self.orchestrator
            .shutdown(self.config.shutdown_grace())
            .await;
    }
}

async fn select_board(cli: &Cli, config: &AppConfig) -> Result<BoardCandidate> {
    if let Some(address) = &cli.address {
        return Ok(BoardCandidate::network(address.clone()));
    }

    let registry = BoardRegistry::from_config(config);
    let boards = registry.discover_supported().await;
    if boards.is_empty() {
        if !registry.check_cli_installed().await {
            return Err(anyhow!(
                "'{}' is not available. Install arduino-cli or set arduino_cli_path in the config",
                config.arduino_cli_path
            ));
        }
        return Err(anyhow!(
            "No supported board found. Connect a board over USB or pass --address"
        ));
    }

    pick_board(boards, cli.board.as_deref(), config.auto_connect)
}

/// Choose among discovered boards: the `selector` match, else the sole or first
/// board when `auto_connect` allows an implicit choice
fn pick_board(
    mut boards: Vec<BoardCandidate>,
    selector: Option<&str>,
    auto_connect: bool,
) -> Result<BoardCandidate> {
    if let Some(selector) = selector {
        return match boards.iter().position(|b| matches_selector(b, selector)) {
            Some(index) => Ok(boards.swap_remove(index)),
            None => Err(anyhow!(
                "No supported board matches '{}'. Found:\n{}",
                selector,
                board_list(&boards)
            )),
        };
    }

    if !auto_connect {
        return Err(anyhow!(
            "auto_connect is disabled; pass --board <serial|port|label> or --address. Found:\n{}",
            board_list(&boards)
        ));
    }

    if boards.len() > 1 {
        warn!("{} supported boards found, using the first one", boards.len());
        println!("{}", board_list(&boards));
    }
    Ok(boards.remove(0))
}

fn matches_selector(board: &BoardCandidate, selector: &str) -> bool {
    let selector = selector.trim();
    board.address() == selector
        || board.label() == selector
        || board
            .hardware_id()
            .is_some_and(|id| id.eq_ignore_ascii_case(selector))
}

fn board_list(boards: &[BoardCandidate]) -> String {
    boards
        .iter()
        .map(|b| format!("  - {} ({})", b.label(), b.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::board::BoardPort;
    use clap::Parser;

    #[tokio::test]
    async fn test_explicit_address_skips_discovery() {
        let cli = Cli::try_parse_from(["unoq", "status", "--address", "10.0.0.7"]).unwrap();
        let config = AppConfig {
            arduino_cli_path: "/nonexistent/arduino-cli".to_string(),
            ..AppConfig::default()
        };

        let board = select_board(&cli, &config).await.unwrap();
        assert_eq!(board.address(), "10.0.0.7");
        assert!(!board.transport().requires_forwarding());
    }

    #[tokio::test]
    async fn test_missing_discovery_tool_is_reported() {
        let cli = Cli::try_parse_from(["unoq", "status"]).unwrap();
        let config = AppConfig {
            arduino_cli_path: "/nonexistent/arduino-cli".to_string(),
            ..AppConfig::default()
        };

        let err = select_board(&cli, &config).await.unwrap_err();
        assert!(err.to_string().contains("not available"));
    }

    fn serial_board(address: &str, serial: &str, label: Option<&str>) -> BoardCandidate {
        BoardCandidate {
            port: BoardPort {
                address: address.to_string(),
                protocol: "serial".to_string(),
                label: label.map(str::to_string),
                hardware_id: Some(serial.to_string()),
            },
            matching_boards: None,
        }
    }

    fn two_boards() -> Vec<BoardCandidate> {
        vec![
            serial_board("/dev/ttyACM0", "AAA111", Some("Bench")),
            serial_board("/dev/ttyACM1", "BBB222", None),
        ]
    }

    #[test]
    fn test_auto_connect_off_requires_a_selector() {
        let err = pick_board(two_boards(), None, false).unwrap_err().to_string();
        assert!(err.contains("auto_connect is disabled"), "{}", err);
        assert!(err.contains("Bench (serial - aaa111)"), "{}", err);

        let single = vec![serial_board("/dev/ttyACM0", "AAA111", None)];
        assert!(pick_board(single, None, false).is_err());
    }

    #[test]
    fn test_auto_connect_on_takes_first_board() {
        let board = pick_board(two_boards(), None, true).unwrap();
        assert_eq!(board.address(), "/dev/ttyACM0");
    }

    #[test]
    fn test_selector_matches_serial_port_or_label() {
        for selector in ["bbb222", "BBB222", "/dev/ttyACM1"] {
            let board = pick_board(two_boards(), Some(selector), false).unwrap();
            assert_eq!(board.address(), "/dev/ttyACM1", "selector {}", selector);
        }
        let board = pick_board(two_boards(), Some("Bench"), true).unwrap();
        assert_eq!(board.address(), "/dev/ttyACM0");

        let err = pick_board(two_boards(), Some("ccc"), true).unwrap_err();
        assert!(err.to_string().contains("No supported board matches 'ccc'"));
    }

    #[test]
    fn test_board_and_address_flags_conflict() {
        assert!(
            Cli::try_parse_from(["unoq", "status", "--address", "10.0.0.7", "--board", "abc"])
                .is_err()
        );
    }
}
