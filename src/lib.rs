//! unoq-link - connectivity and session layer for Arduino UNO Q boards
//!
//! Discovers boards through `arduino-cli`, reaches USB-attached boards through
//! an `adb` port forward, tracks the connection in a single session, and talks
//! to the board's orchestrator over versioned HTTP requests and push-event
//! streams.

pub mod board;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod remote;
pub mod services;
pub mod session;
pub mod tunnel;
pub mod utils;

// Re-export commonly used types
pub use board::BoardRegistry;
pub use errors::*;
pub use models::*;
pub use remote::{EventStreamClient, RequestClient, StreamHandlers, Subscription};
pub use services::Orchestrator;
pub use session::{ConnectionSession, ConnectionState, SessionSnapshot};
pub use tunnel::{AdbHelper, ForwardHelper, TunnelManager};

/// unoq-link version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI application name
pub const APP_NAME: &str = "unoq";
