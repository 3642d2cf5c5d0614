//! Long-lived push-event subscriptions
//!
//! Each subscription runs on its own task with its own failure domain. Handler
//! invocation and `close()` share one lock and a `closed` flag, so once
//! `close()` returns no handler of that subscription runs again. Handlers must
//! not call `close()` on their own subscription; cancel a clone of the
//! [`CancellationToken`] from [`Subscription::cancel_token`] instead.

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::errors::{LinkError, Result};
use crate::models::events::StreamEvent;
use crate::remote::client::api_url;
use crate::remote::sse::SseDecoder;
use crate::session::ConnectionSession;

type EventCallback = Box<dyn FnMut(StreamEvent) + Send>;
type ErrorCallback = Box<dyn FnMut(LinkError) + Send>;
type CloseCallback = Box<dyn FnOnce() + Send>;

/// Callbacks for one subscription
#[derive(Default)]
pub struct StreamHandlers {
    on_event: Option<EventCallback>,
    on_error: Option<ErrorCallback>,
    on_close: Option<CloseCallback>,
}

impl StreamHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every routed event, named or from the default channel
    pub fn on_event(mut self, f: impl FnMut(StreamEvent) + Send + 'static) -> Self {
        self.on_event = Some(Box::new(f));
        self
    }

    /// Connection-level failures; `error` events go to `on_event`
    pub fn on_error(mut self, f: impl FnMut(LinkError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Runs exactly once, when the subscription is closed or the stream ends
    pub fn on_close(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }
}

struct Dispatch {
    closed: bool,
    handlers: StreamHandlers,
}

struct Shared {
    path: String,
    dispatch: Mutex<Dispatch>,
    cancel: CancellationToken,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Dispatch> {
        self.dispatch
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn deliver(&self, event: StreamEvent) {
        let mut dispatch = self.lock();
        if dispatch.closed {
            return;
        }
        if let Some(on_event) = dispatch.handlers.on_event.as_mut() {
            on_event(event);
        }
    }

    fn fail(&self, err: LinkError) {
        let mut dispatch = self.lock();
        if dispatch.closed {
            return;
        }
        log::warn!("Event stream {} failed: {}", self.path, err);
        if let Some(on_error) = dispatch.handlers.on_error.as_mut() {
            on_error(err);
        }
    }

    /// Mark closed, stop the task and run `on_close` once
    fn finish(&self) {
        let on_close = {
            let mut dispatch = self.lock();
            if dispatch.closed {
                return;
            }
            dispatch.closed = true;
            dispatch.handlers.on_event = None;
            dispatch.handlers.on_error = None;
            dispatch.handlers.on_close.take()
        };
        self.cancel.cancel();
        log::debug!("Event stream {} closed", self.path);
        if let Some(on_close) = on_close {
            on_close();
        }
    }
}

/// Handle to one open event stream. Dropping it closes the stream.
pub struct Subscription {
    shared: Arc<Shared>,
}

impl Subscription {
    pub fn path(&self) -> &str {
        &self.shared.path
    }

    /// Terminate the connection and run `on_close`. Idempotent.
    pub fn close(&self) {
        self.shared.finish();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Resolves once the subscription has closed, by either side
    pub async fn closed(&self) {
        self.shared.cancel.cancelled().await;
    }

    /// Token cancelled when the subscription closes; cancelling it closes the subscription
    pub fn cancel_token(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shared.finish();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.shared.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Opens push-event connections against the session's orchestrator
#[derive(Clone)]
pub struct EventStreamClient {
    http: Client,
    session: Arc<ConnectionSession>,
}

impl EventStreamClient {
    pub fn new(session: Arc<ConnectionSession>) -> Self {
        Self {
            http: Client::new(),
            session,
        }
    }

    /// Open `<base>/v1<path>` and route its events to `handlers`.
    /// Must be called from within a Tokio runtime.
    pub fn open_stream(&self, path: &str, handlers: StreamHandlers) -> Result<Subscription> {
        let base = self.session.base_url().ok_or(LinkError::NotConnected)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LinkError::Stream(format!("no async runtime: {}", e)))?;

        let url = api_url(&base, path);
        log::debug!("SSE connect: {}", path);

        let shared = Arc::new(Shared {
            path: path.to_string(),
            dispatch: Mutex::new(Dispatch {
                closed: false,
                handlers,
            }),
            cancel: CancellationToken::new(),
        });

        runtime.spawn(run_stream(shared.clone(), self.http.clone(), url));
        Ok(Subscription { shared })
    }
}

async fn run_stream(shared: Arc<Shared>, http: Client, url: String) {
    let result = tokio::select! {
        _ = shared.cancel.cancelled() => Ok(()),
        result = pump(&shared, &http, &url) => result,
    };

    if let Err(e) = result {
        shared.fail(e);
    }
    shared.finish();
}

async fn pump(shared: &Shared, http: &Client, url: &str) -> Result<()> {
    let response = http
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
        .map_err(|e| LinkError::Stream(format!("SSE connection error: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LinkError::Stream(format!(
            "SSE connection error: {} returned {}",
            shared.path, status
        )));
    }

    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| LinkError::Stream(format!("SSE connection error: {}", e)))?;
        for message in decoder.feed(&chunk) {
            match StreamEvent::decode(message.event.as_deref(), &message.data) {
                Some(event) => shared.deliver(event),
                None => log::trace!(
                    "Ignoring unregistered event {:?} on {}",
                    message.event,
                    shared.path
                ),
            }
        }
    }

    log::debug!("SSE stream {} ended by server", shared.path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::{EventName, EventPayload};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn detached(handlers: StreamHandlers) -> Subscription {
        Subscription {
            shared: Arc::new(Shared {
                path: "/apps/events".to_string(),
                dispatch: Mutex::new(Dispatch {
                    closed: false,
                    handlers,
                }),
                cancel: CancellationToken::new(),
            }),
        }
    }

    #[test]
    fn test_close_runs_on_close_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = closes.clone();
        let sub = detached(StreamHandlers::new().on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        sub.close();
        sub.close();
        assert!(sub.is_closed());
        drop(sub);

        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_delivery_after_close() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = detached(StreamHandlers::new().on_event(move |event| {
            sink.lock().unwrap().push(event.name);
        }));

        let event = StreamEvent {
            name: EventName::App,
            payload: EventPayload::Text("x".into()),
        };
        sub.shared.deliver(event.clone());
        sub.close();
        sub.shared.deliver(event);
        sub.shared.fail(LinkError::Stream("late".into()));

        assert_eq!(*seen.lock().unwrap(), vec![EventName::App]);
        assert!(sub.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_open_stream_requires_connection() {
        use crate::tunnel::TunnelManager;
        use crate::tunnel::manager::mock::RecordingHelper;

        let tunnel = TunnelManager::new(Arc::new(RecordingHelper::default()), 8800);
        let session = Arc::new(ConnectionSession::new(tunnel, 8800));
        let client = EventStreamClient::new(session);

        let err = client
            .open_stream("/apps/events", StreamHandlers::new())
            .unwrap_err();
        assert!(matches!(err, LinkError::NotConnected));
    }
}
