//! Board discovery through the external `arduino-cli` tool

use std::process::Stdio;
use tokio::process::Command;

use crate::config::AppConfig;
use crate::errors::{LinkError, Result};
use crate::models::board::{BoardCandidate, BoardListOutput};

/// Enumerates candidate boards and filters them to the supported hardware
#[derive(Debug, Clone)]
pub struct BoardRegistry {
    cli_path: String,
    target_fqbn: String,
}

impl BoardRegistry {
    pub fn new(cli_path: impl Into<String>, target_fqbn: impl Into<String>) -> Self {
        Self {
            cli_path: cli_path.into(),
            target_fqbn: target_fqbn.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.arduino_cli_path, &config.target_fqbn)
    }

    pub fn target_fqbn(&self) -> &str {
        &self.target_fqbn
    }

    /// List every board the discovery tool reports.
    /// A missing tool or a failing run yields an empty list.
    pub async fn discover(&self) -> Vec<BoardCandidate> {
        match self.try_discover().await {
            Ok(boards) => {
                log::debug!("Discovery reported {} board(s)", boards.len());
                boards
            }
            Err(e) => {
                log::warn!("{}", e);
                Vec::new()
            }
        }
    }

    async fn try_discover(&self) -> Result<Vec<BoardCandidate>> {
        let args = ["board", "list", "--format", "json"];
        log::debug!("Running: {} {}", self.cli_path, args.join(" "));

        let output = Command::new(&self.cli_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| LinkError::Discovery(format!("failed to run {}: {}", self.cli_path, e)))?;

        if !output.status.success() {
            return Err(LinkError::Discovery(format!(
                "{} exited with {}: {}",
                self.cli_path,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_board_list(&String::from_utf8_lossy(&output.stdout))
    }

    /// Keep only the candidates advertising the target board descriptor, in input order
    pub fn filter_supported(&self, candidates: Vec<BoardCandidate>) -> Vec<BoardCandidate> {
        filter_supported(candidates, &self.target_fqbn)
    }

    /// Discover and filter in one call
    pub async fn discover_supported(&self) -> Vec<BoardCandidate> {
        self.filter_supported(self.discover().await)
    }

    /// Check whether the discovery tool can be executed at all
    pub async fn check_cli_installed(&self) -> bool {
        Command::new(&self.cli_path)
            .arg("version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

/// Parse the JSON emitted by `board list --format json`
pub fn parse_board_list(json: &str) -> Result<Vec<BoardCandidate>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let parsed: BoardListOutput = serde_json::from_str(trimmed)
        .map_err(|e| LinkError::Discovery(format!("unreadable board list: {}", e)))?;
    Ok(parsed.detected_ports)
}

pub fn filter_supported(candidates: Vec<BoardCandidate>, fqbn: &str) -> Vec<BoardCandidate> {
    candidates
        .into_iter()
        .filter(|board| board.matches_fqbn(fqbn))
        .collect()
}
