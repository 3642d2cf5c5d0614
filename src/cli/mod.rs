//! Command Line Interface module
//!
//! Argument parsing and the `unoq` command implementations.

pub mod args;
pub mod commands;

pub use args::*;

use anyhow::{Context, Result};
use log::LevelFilter;

use crate::config::AppConfig;
use crate::utils::logging;

/// Main CLI application runner
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config = AppConfig::load_with_env(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let level = if cli.verbose > 0 || cli.quiet {
        logging::level_from_flags(cli.verbose, cli.quiet)
    } else {
        logging::level_from_name(&config.log_level).unwrap_or(LevelFilter::Info)
    };
    logging::init_cli_logging(level, cli.log_file.as_deref())?;

    commands::execute_command(cli.command.clone(), &cli, config).await
}
