//! Board-related data models

use serde::{Deserialize, Serialize};

/// How a board is reached from the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Reachable over the network at its reported address
    Network,
    /// USB-attached; the orchestrator is only reachable through a port forward
    Serial,
    /// Any other protocol tag reported by discovery
    Other(String),
}

impl Transport {
    pub fn from_protocol(protocol: &str) -> Self {
        match protocol {
            "network" => Transport::Network,
            "serial" => Transport::Serial,
            other => Transport::Other(other.to_string()),
        }
    }

    /// True when the orchestrator must be reached through a tunnel
    pub fn requires_forwarding(&self) -> bool {
        matches!(self, Transport::Serial)
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Network => write!(f, "network"),
            Transport::Serial => write!(f, "serial"),
            Transport::Other(tag) => write!(f, "{}", tag),
        }
    }
}

/// Port section of a discovery entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPort {
    pub address: String,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_id: Option<String>,
}

/// Compatible-board descriptor reported by discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingBoard {
    pub name: String,
    pub fqbn: String,
}

/// A board as reported by one discovery run. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCandidate {
    pub port: BoardPort,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_boards: Option<Vec<MatchingBoard>>,
}

impl BoardCandidate {
    /// A board reached directly over the network, bypassing discovery
    pub fn network(address: impl Into<String>) -> Self {
        Self {
            port: BoardPort {
                address: address.into(),
                protocol: "network".to_string(),
                label: None,
                hardware_id: None,
            },
            matching_boards: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.port.address
    }

    pub fn transport(&self) -> Transport {
        Transport::from_protocol(&self.port.protocol)
    }

    /// Hardware serial, lower-cased as the forwarding helper expects it
    pub fn hardware_id(&self) -> Option<String> {
        self.port
            .hardware_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(str::to_lowercase)
    }

    /// True when any compatible-board descriptor equals `fqbn`
    pub fn matches_fqbn(&self, fqbn: &str) -> bool {
        self.matching_boards
            .as_ref()
            .is_some_and(|boards| boards.iter().any(|b| b.fqbn == fqbn))
    }

    /// Short name for pickers: port label, else serial, else address
    pub fn label(&self) -> String {
        self.port
            .label
            .clone()
            .or_else(|| self.hardware_id())
            .unwrap_or_else(|| self.port.address.clone())
    }

    /// Picker description: `<protocol> - <serial or address>`
    pub fn description(&self) -> String {
        format!(
            "{} - {}",
            self.port.protocol,
            self.hardware_id()
                .unwrap_or_else(|| self.port.address.clone())
        )
    }
}

/// Top-level shape of `board list --format json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardListOutput {
    #[serde(default)]
    pub detected_ports: Vec<BoardCandidate>,
}
