//! Application configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{LinkError, Result};

/// Board descriptor every supported board must advertise in `matching_boards`
pub const DEFAULT_TARGET_FQBN: &str = "arduino:zephyr:unoq";

/// Port the board-side orchestrator listens on
pub const ORCHESTRATOR_PORT: u16 = 8800;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Discovery tool executable (name on PATH or absolute path)
    pub arduino_cli_path: String,
    /// Explicit forwarding helper location, skips the well-known path search
    pub adb_path: Option<PathBuf>,
    /// Board descriptor used to filter discovery results
    pub target_fqbn: String,
    /// Remote orchestrator port, also the preferred local tunnel port
    pub orchestrator_port: u16,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Upper bound on tunnel teardown at shutdown, in seconds
    pub shutdown_grace_secs: u64,
    /// Pick a discovered board without `--board`; when false a selector is required
    pub auto_connect: bool,
    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            arduino_cli_path: "arduino-cli".to_string(),
            adb_path: None,
            target_fqbn: DEFAULT_TARGET_FQBN.to_string(),
            orchestrator_port: ORCHESTRATOR_PORT,
            request_timeout_secs: 30,
            shutdown_grace_secs: 5,
            auto_connect: true,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Default configuration file location (`<config dir>/unoq-link/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("unoq-link").join("config.toml"))
    }

    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| LinkError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from the given path (or the default location) and apply environment overrides
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `UNOQ_*` overrides using the given variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cli) = lookup("UNOQ_ARDUINO_CLI") {
            self.arduino_cli_path = cli;
        }
        if let Some(adb) = lookup("UNOQ_ADB_PATH") {
            self.adb_path = Some(PathBuf::from(adb));
        }
        if let Some(timeout) = lookup("UNOQ_REQUEST_TIMEOUT") {
            self.request_timeout_secs = timeout.trim().parse().map_err(|_| {
                LinkError::Config(format!("UNOQ_REQUEST_TIMEOUT must be seconds, got '{timeout}'"))
            })?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
