//! Error types for unoq-link

use thiserror::Error;

/// Main error type for board connectivity operations
#[derive(Debug, Error)]
pub enum LinkError {
    /// The discovery tool is missing or exited with a failure.
    /// Only produced internally; `discover()` recovers it as an empty list.
    #[error("Board discovery failed: {0}")]
    Discovery(String),

    /// The forwarding helper executable could not be located
    #[error("Forwarding helper (adb) not found. Install Arduino IDE or android-platform-tools")]
    HelperNotFound,

    /// Installing or removing a forward rule failed
    #[error("Tunnel error: {message}")]
    Tunnel {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The selected board requires forwarding but reported no hardware id
    #[error("Board serial number not found")]
    MissingHardwareId,

    /// A request or stream was attempted without a resolved base URL
    #[error("Not connected to board")]
    NotConnected,

    /// The orchestrator answered with a non-success status
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The caller-supplied deadline elapsed before the request completed
    #[error("Request timed out")]
    Timeout,

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// Transport-level HTTP failure (connection refused, reset, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Event stream connection failure
    #[error("Event stream error: {0}")]
    Stream(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LinkError {
    pub(crate) fn tunnel(message: impl Into<String>) -> Self {
        LinkError::Tunnel {
            message: message.into(),
            source: None,
        }
    }

    /// True for the variants a caller may reasonably retry after reconnecting
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            LinkError::NotConnected | LinkError::Http(_) | LinkError::Stream(_)
        )
    }
}

/// Result type alias for unoq-link operations
pub type Result<T> = std::result::Result<T, LinkError>;
