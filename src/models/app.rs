//! Orchestrator resource models used by the operation layer

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of an app on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub status: AppStatus,
    #[serde(default)]
    pub example: bool,
    #[serde(default)]
    pub default: bool,
}

/// Port an app exposes on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedPort {
    pub port: u16,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub available: bool,
    #[serde(default)]
    pub packages: Vec<String>,
}

/// Metric kinds carried by the resources feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Cpu,
    Mem,
    Disk,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            ResourceKind::Cpu => "cpu",
            ResourceKind::Mem => "mem",
            ResourceKind::Disk => "disk",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEvent {
    pub kind: ResourceKind,
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_info_tolerates_unknown_status() {
        let app: AppInfo =
            serde_json::from_str(r#"{"id":"blink","name":"Blink","status":"paused"}"#).unwrap();
        assert_eq!(app.status, AppStatus::Unknown);
        assert!(!app.example);

        let app: AppInfo = serde_json::from_str(
            r#"{"id":"blink","name":"Blink","status":"running","default":true}"#,
        )
        .unwrap();
        assert_eq!(app.status, AppStatus::Running);
        assert!(app.default);
    }
}
