//! Connection session: the single source of truth for board connectivity
//!
//! All mutations (`connect`, `disconnect`, `shutdown`) are serialized behind one
//! async mutex that is held for the whole operation, including tunnel setup and
//! teardown. Readers never take that lock: every transition publishes a
//! [`SessionSnapshot`] on a watch channel, and `is_connected` / `base_url` read
//! the latest snapshot.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};

use crate::board::BoardRegistry;
use crate::config::AppConfig;
use crate::errors::{LinkError, Result};
use crate::models::board::BoardCandidate;
use crate::tunnel::{AdbHelper, TunnelManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "Idle"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

/// Read-only view of the session published after every transition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: ConnectionState,
    pub board: Option<BoardCandidate>,
    pub tunnel_port: Option<u16>,
    pub base_url: Option<String>,
}

impl SessionSnapshot {
    pub fn is_connected(&self) -> bool {
        match &self.board {
            Some(board) => !board.transport().requires_forwarding() || self.tunnel_port.is_some(),
            None => false,
        }
    }
}

/// Base URL for the orchestrator given the selected board and tunnel
pub fn derive_base_url(
    board: Option<&BoardCandidate>,
    tunnel_port: Option<u16>,
    orchestrator_port: u16,
) -> Option<String> {
    let board = board?;
    if board.transport().requires_forwarding() {
        tunnel_port.map(|port| format!("http://localhost:{}", port))
    } else {
        Some(format!("http://{}:{}", board.address(), orchestrator_port))
    }
}

struct SessionInner {
    board: Option<BoardCandidate>,
    password: Option<String>,
    tunnel: TunnelManager,
}

pub struct ConnectionSession {
    inner: Mutex<SessionInner>,
    snapshot: watch::Sender<SessionSnapshot>,
    orchestrator_port: u16,
}

impl ConnectionSession {
    pub fn new(tunnel: TunnelManager, orchestrator_port: u16) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Mutex::new(SessionInner {
                board: None,
                password: None,
                tunnel,
            }),
            snapshot,
            orchestrator_port,
        }
    }

    /// Session using the adb helper configured in `config`
    pub fn from_config(config: &AppConfig) -> Self {
        let helper = Arc::new(AdbHelper::new(config.adb_path.clone()));
        let tunnel = TunnelManager::new(helper, config.orchestrator_port);
        Self::new(tunnel, config.orchestrator_port)
    }

    /// Select `board` and make its orchestrator reachable.
    ///
    /// Any previously selected board is released first, including its tunnel.
    /// On failure the session is left `Idle` with no board selected.
    pub async fn connect(&self, board: BoardCandidate, password: Option<String>) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if let Some(previous) = inner.board.take() {
            log::info!("Releasing board at {}", previous.address());
        }
        inner.tunnel.close().await;
        inner.password = None;

        log::info!("Selected board at {}", board.address());
        inner.board = Some(board.clone());
        inner.password = password;
        self.publish(&inner, ConnectionState::Connecting);

        if board.transport().requires_forwarding() {
            let opened = match board.hardware_id() {
                Some(serial) => inner.tunnel.open(&serial).await,
                None => Err(LinkError::MissingHardwareId),
            };
            if let Err(e) = opened {
                log::error!("Failed to connect to {}: {}", board.address(), e);
                inner.board = None;
                inner.password = None;
                self.publish(&inner, ConnectionState::Idle);
                return Err(e);
            }
        }

        self.publish(&inner, ConnectionState::Connected);
        if let Some(url) = self.base_url() {
            log::info!("Connected to orchestrator at {}", url);
        }
        Ok(())
    }

    /// Tear down any tunnel and forget the board. Safe to call in any state.
    pub async fn disconnect(&self) {
        self.release(None).await;
    }

    /// Disconnect, giving tunnel teardown at most `grace` to finish.
    /// The session is Idle on return even when the helper overruns.
    pub async fn shutdown(&self, grace: Duration) {
        self.release(Some(grace)).await;
    }

    async fn release(&self, grace: Option<Duration>) {
        let mut inner = self.inner.lock().await;
        let tunnel = inner.tunnel.detach();
        if let Some(board) = inner.board.take() {
            log::info!("Disconnected from board at {}", board.address());
        }
        inner.password = None;
        self.publish(&inner, ConnectionState::Idle);

        if let Some(tunnel) = tunnel {
            inner.tunnel.release(tunnel, grace).await;
        }
    }

    /// Connect when discovery finds exactly one supported board
    pub async fn auto_connect(&self, registry: &BoardRegistry) -> Result<Option<BoardCandidate>> {
        let mut boards = registry.discover_supported().await;
        if boards.len() != 1 {
            log::debug!(
                "Auto-connect skipped: {} supported board(s) found",
                boards.len()
            );
            return Ok(None);
        }

        let board = boards.remove(0);
        self.connect(board.clone(), None).await?;
        Ok(Some(board))
    }

    pub fn is_connected(&self) -> bool {
        self.snapshot.borrow().is_connected()
    }

    pub fn base_url(&self) -> Option<String> {
        self.snapshot.borrow().base_url.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.snapshot.borrow().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Follow state transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    pub async fn password(&self) -> Option<String> {
        self.inner.lock().await.password.clone()
    }

    fn publish(&self, inner: &SessionInner, state: ConnectionState) {
        let tunnel_port = inner.tunnel.active().map(|t| t.local_port);
        let snapshot = SessionSnapshot {
            state,
            board: inner.board.clone(),
            tunnel_port,
            base_url: derive_base_url(inner.board.as_ref(), tunnel_port, self.orchestrator_port),
        };
        log::debug!("Session state: {}", state);
        self.snapshot.send_replace(snapshot);
    }
}
