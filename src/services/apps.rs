//! App lifecycle, log tail and app-event feeds

use crate::errors::Result;
use crate::models::app::{AppInfo, ExposedPort};
use crate::models::events::{EventName, EventPayload, StreamEvent};
use crate::remote::{StreamHandlers, Subscription};
use crate::services::Orchestrator;
use crate::services::operation::OperationHandle;
use crate::services::streams::StreamPurpose;

pub struct AppService<'a> {
    orchestrator: &'a Orchestrator,
}

impl<'a> AppService<'a> {
    pub fn new(orchestrator: &'a Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn list_apps(&self, filter: Option<&str>, status: Option<&str>) -> Result<Vec<AppInfo>> {
        let mut query = Vec::new();
        if let Some(filter) = filter {
            query.push(("filter", filter));
        }
        if let Some(status) = status {
            query.push(("status", status));
        }
        self.orchestrator.requests().get("/apps", &query).await
    }

    pub async fn get_app(&self, id: &str) -> Result<AppInfo> {
        self.orchestrator
            .requests()
            .get(&format!("/apps/{}", id), &[])
            .await
    }

    pub async fn exposed_ports(&self, id: &str) -> Result<Vec<ExposedPort>> {
        self.orchestrator
            .requests()
            .get(&format!("/apps/{}/exposed-ports", id), &[])
            .await
    }

    /// Start an app; opening the feedback stream triggers the start
    pub fn start_app(&self, id: &str) -> Result<OperationHandle> {
        log::info!("Starting app {}", id);
        let (handle, _) =
            OperationHandle::open(self.orchestrator.streams(), &format!("/apps/{}/start", id))?;
        Ok(handle)
    }

    /// Stop an app; opening the feedback stream triggers the stop
    pub fn stop_app(&self, id: &str) -> Result<OperationHandle> {
        log::info!("Stopping app {}", id);
        let (handle, _) =
            OperationHandle::open(self.orchestrator.streams(), &format!("/apps/{}/stop", id))?;
        Ok(handle)
    }

    /// Tail the logs of `id`, replacing any log tail already open
    pub fn stream_logs<F>(&self, id: &str, mut on_line: F) -> Result<()>
    where
        F: FnMut(String) + Send + 'static,
    {
        let handlers = StreamHandlers::new().on_event(move |event| {
            if matches!(event.name, EventName::Log | EventName::Message) {
                on_line(event.payload.to_line());
            }
        });
        self.orchestrator.singletons().open(
            StreamPurpose::LogTail,
            &format!("/apps/{}/logs", id),
            handlers,
        )
    }

    pub fn stop_log_stream(&self) {
        self.orchestrator.singletons().close(StreamPurpose::LogTail);
    }

    /// Follow app-list changes, replacing any existing subscription
    pub fn subscribe_events<F>(&self, on_app: F) -> Result<()>
    where
        F: FnMut(AppInfo) + Send + 'static,
    {
        self.orchestrator.singletons().open(
            StreamPurpose::AppEvents,
            "/apps/events",
            app_event_handlers(on_app),
        )
    }

    pub fn unsubscribe_events(&self) {
        self.orchestrator.singletons().close(StreamPurpose::AppEvents);
    }

    /// Follow changes of a single app. Not tracked; the caller owns the subscription.
    pub fn subscribe_app_events<F>(&self, id: &str, on_app: F) -> Result<Subscription>
    where
        F: FnMut(AppInfo) + Send + 'static,
    {
        self.orchestrator
            .streams()
            .open_stream(&format!("/apps/{}/events", id), app_event_handlers(on_app))
    }
}

fn app_event_handlers<F>(mut on_app: F) -> StreamHandlers
where
    F: FnMut(AppInfo) + Send + 'static,
{
    StreamHandlers::new().on_event(move |event| {
        if let Some(app) = decode_app(event) {
            on_app(app);
        }
    })
}

fn decode_app(event: StreamEvent) -> Option<AppInfo> {
    if event.name != EventName::App {
        return None;
    }
    match event.payload {
        EventPayload::Json(value) => match serde_json::from_value(value) {
            Ok(app) => Some(app),
            Err(e) => {
                log::debug!("Ignoring malformed app event: {}", e);
                None
            }
        },
        EventPayload::Text(_) => None,
    }
}
