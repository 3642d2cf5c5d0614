//! Command line argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "unoq")]
#[command(about = "Connect to Arduino UNO Q boards and drive their app orchestrator")]
pub struct Cli {
    /// Board address to use directly, skipping USB discovery
    #[arg(long, global = true, value_name = "HOST")]
    pub address: Option<String>,

    /// Discovered board to use, by serial, port address or label
    #[arg(long, global = true, value_name = "SELECTOR", conflicts_with = "address")]
    pub board: Option<String>,

    /// Board password to keep with the session
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease logging verbosity (only errors)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Write logs to a file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Commands {
    /// List supported boards found by discovery
    Boards {
        /// Show every detected port, not only supported boards
        #[arg(long)]
        all: bool,
    },
    /// Connect and report orchestrator version and board name
    Status,
    /// List apps installed on the board
    Apps {
        /// Free-text filter forwarded to the board
        #[arg(short, long)]
        filter: Option<String>,
        /// Only apps with this status (e.g. running, stopped)
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Start an app and follow its progress
    Start {
        /// App identifier
        id: String,
    },
    /// Stop an app and follow its progress
    Stop {
        /// App identifier
        id: String,
    },
    /// Tail the logs of an app until interrupted
    Logs {
        /// App identifier
        id: String,
    },
    /// Follow cpu, memory and disk usage until interrupted
    Resources,
    /// Check for system updates, optionally applying them
    Update {
        /// Apply available updates and follow their progress
        #[arg(long)]
        apply: bool,
        /// Restrict to Arduino-provided packages
        #[arg(long)]
        only_arduino: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
