//! Tunnel lifecycle: local port selection and forward rule install/teardown

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{LinkError, Result};
use crate::tunnel::helper::ForwardHelper;

/// An installed forward from `localhost:<local_port>` to the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tunnel {
    pub local_port: u16,
    pub hardware_id: String,
}

/// Owns at most one tunnel at a time
pub struct TunnelManager {
    helper: Arc<dyn ForwardHelper>,
    remote_port: u16,
    preferred_local_port: u16,
    active: Option<Tunnel>,
}

impl TunnelManager {
    /// Forwards to `remote_port` on the device, preferring the same port locally
    pub fn new(helper: Arc<dyn ForwardHelper>, remote_port: u16) -> Self {
        Self {
            helper,
            remote_port,
            preferred_local_port: remote_port,
            active: None,
        }
    }

    pub fn with_preferred_local_port(mut self, port: u16) -> Self {
        self.preferred_local_port = port;
        self
    }

    pub fn active(&self) -> Option<&Tunnel> {
        self.active.as_ref()
    }

    /// Resolved forwarding helper executable
    pub fn helper_path(&self) -> Option<PathBuf> {
        self.helper.executable()
    }

    /// Open a forward for `hardware_id` and return the local port.
    /// Any tunnel already open is closed first.
    pub async fn open(&mut self, hardware_id: &str) -> Result<u16> {
        if self.active.is_some() {
            self.close().await;
        }

        let local_port = pick_local_port(self.preferred_local_port)?;
        log::info!(
            "Starting ADB forward for {} on port {}",
            hardware_id,
            local_port
        );

        self.helper
            .forward(hardware_id, local_port, self.remote_port)
            .await
            .map_err(|e| match e {
                LinkError::HelperNotFound => LinkError::HelperNotFound,
                LinkError::Tunnel { message, source } => LinkError::Tunnel {
                    message: format!("ADB forward failed: {}", message),
                    source,
                },
                other => LinkError::tunnel(format!("ADB forward failed: {}", other)),
            })?;

        self.active = Some(Tunnel {
            local_port,
            hardware_id: hardware_id.to_string(),
        });
        Ok(local_port)
    }

    /// Remove the forward rules of the active tunnel. Never fails.
    pub async fn close(&mut self) {
        if let Some(tunnel) = self.detach() {
            self.release(tunnel, None).await;
        }
    }

    /// Like [`close`](Self::close), giving the helper at most `grace`
    pub async fn close_within(&mut self, grace: Duration) {
        if let Some(tunnel) = self.detach() {
            self.release(tunnel, Some(grace)).await;
        }
    }

    /// Forget the active tunnel without touching its forward rules
    pub fn detach(&mut self) -> Option<Tunnel> {
        self.active.take()
    }

    /// Remove the forward rules of a detached tunnel. Never fails.
    pub async fn release(&self, tunnel: Tunnel, grace: Option<Duration>) {
        let removal = self.helper.remove_all(&tunnel.hardware_id);
        let result = match grace {
            Some(grace) => match tokio::time::timeout(grace, removal).await {
                Ok(result) => result,
                Err(_) => {
                    log::warn!(
                        "ADB forward removal for {} did not finish within {:?}; forward rules may remain",
                        tunnel.hardware_id,
                        grace
                    );
                    return;
                }
            },
            None => removal.await,
        };

        match result {
            Ok(()) => log::info!("ADB forward removed for {}", tunnel.hardware_id),
            Err(e) => log::warn!(
                "Failed to remove ADB forward for {}: {}",
                tunnel.hardware_id,
                e
            ),
        }
    }
}

/// Use `preferred` when nothing is listening on it, else an OS-assigned port
pub fn pick_local_port(preferred: u16) -> Result<u16> {
    if port_available(preferred) {
        return Ok(preferred);
    }

    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    let port = listener.local_addr()?.port();
    log::debug!(
        "Local port {} is in use, falling back to {}",
        preferred,
        port
    );
    Ok(port)
}

fn port_available(port: u16) -> bool {
    port != 0 && TcpListener::bind(("127.0.0.1", port)).is_ok()
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records helper calls; optionally fails `forward`
    #[derive(Default)]
    pub(crate) struct RecordingHelper {
        pub calls: Mutex<Vec<String>>,
        pub fail_forward: bool,
        pub missing: bool,
        /// Delay before `remove_all` completes
        pub remove_delay: Option<Duration>,
    }

    impl RecordingHelper {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ForwardHelper for RecordingHelper {
        async fn forward(&self, hardware_id: &str, local_port: u16, remote_port: u16) -> Result<()> {
            if self.missing {
                return Err(LinkError::HelperNotFound);
            }
            self.calls
                .lock()
                .unwrap()
                .push(format!("forward {} {}->{}", hardware_id, local_port, remote_port));
            if self.fail_forward {
                return Err(LinkError::tunnel("device offline"));
            }
            Ok(())
        }

        async fn remove_all(&self, hardware_id: &str) -> Result<()> {
            if let Some(delay) = self.remove_delay {
                tokio::time::sleep(delay).await;
            }
            self.calls
                .lock()
                .unwrap()
                .push(format!("remove-all {}", hardware_id));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::RecordingHelper;
    use super::*;

    fn free_port() -> u16 {
        TcpListener::bind(("127.0.0.1", 0))
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[tokio::test]
    async fn test_open_uses_preferred_port_when_free() {
        let helper = Arc::new(RecordingHelper::default());
        let preferred = free_port();
        let mut manager = TunnelManager::new(helper.clone(), 8800).with_preferred_local_port(preferred);

        let port = manager.open("abc123").await.unwrap();

        assert_eq!(port, preferred);
        assert_eq!(helper.calls(), vec![format!("forward abc123 {}->8800", preferred)]);
        assert_eq!(manager.active().map(|t| t.local_port), Some(preferred));
    }

    #[tokio::test]
    async fn test_open_falls_back_when_port_taken() {
        let occupied = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let taken = occupied.local_addr().unwrap().port();

        let helper = Arc::new(RecordingHelper::default());
        let mut manager = TunnelManager::new(helper.clone(), 8800).with_preferred_local_port(taken);

        let port = manager.open("ABC123").await.unwrap();

        assert_ne!(port, taken);
        assert_ne!(port, 0);
        assert_eq!(helper.calls(), vec![format!("forward ABC123 {}->8800", port)]);
        drop(occupied);
    }

    #[tokio::test]
    async fn test_open_for_new_serial_closes_old_tunnel_first() {
        let helper = Arc::new(RecordingHelper::default());
        let preferred = free_port();
        let mut manager = TunnelManager::new(helper.clone(), 8800).with_preferred_local_port(preferred);

        manager.open("aaa").await.unwrap();
        manager.open("bbb").await.unwrap();

        let calls = helper.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].starts_with("forward aaa"));
        assert_eq!(calls[1], "remove-all aaa");
        assert!(calls[2].starts_with("forward bbb"));
        assert_eq!(manager.active().unwrap().hardware_id, "bbb");
    }

    #[tokio::test]
    async fn test_failed_forward_leaves_no_tunnel() {
        let helper = Arc::new(RecordingHelper {
            fail_forward: true,
            ..Default::default()
        });
        let mut manager = TunnelManager::new(helper, 8800).with_preferred_local_port(free_port());

        let err = manager.open("abc123").await.unwrap_err();
        assert!(err.to_string().contains("ADB forward failed"));
        assert!(manager.active().is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let helper = Arc::new(RecordingHelper::default());
        let mut manager = TunnelManager::new(helper.clone(), 8800).with_preferred_local_port(free_port());

        manager.open("abc123").await.unwrap();
        manager.close().await;
        manager.close().await;

        assert_eq!(helper.calls().len(), 2);
        assert!(manager.active().is_none());
    }

    #[tokio::test]
    async fn test_close_within_gives_up_on_slow_helper() {
        let helper = Arc::new(RecordingHelper {
            remove_delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let mut manager = TunnelManager::new(helper.clone(), 8800).with_preferred_local_port(free_port());
        manager.open("abc123").await.unwrap();

        let started = std::time::Instant::now();
        manager.close_within(Duration::from_millis(50)).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(manager.active().is_none());
        assert_eq!(helper.calls().len(), 1);
    }
}
