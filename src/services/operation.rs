//! Fire-and-forget-with-feedback operations (app start/stop, update apply)
//!
//! The stream is the only channel for the terminal status: an `error` event
//! means the operation failed, a stream that ends without one means it
//! succeeded.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::errors::Result;
use crate::models::events::{EventName, EventPayload, StreamEvent};
use crate::remote::{EventStreamClient, StreamHandlers, Subscription};

/// Non-terminal feedback from a running operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationUpdate {
    /// Fraction reported by a `progress` event
    Progress(f64),
    Message(String),
    Log(String),
    Restarting(String),
}

/// Terminal status of an operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    Succeeded,
    /// The board reported an `error` event
    Failed { code: String, message: String },
    /// The feedback stream itself broke before the operation reported anything terminal
    Interrupted(String),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Succeeded)
    }
}

#[derive(Debug)]
pub(crate) enum OperationEvent {
    Update(OperationUpdate),
    Failed { code: String, message: String },
    Interrupted(String),
    Closed,
}

/// Translate a stream event into operation feedback
pub(crate) fn classify(event: StreamEvent) -> Option<OperationEvent> {
    let update = match event.name {
        EventName::Progress => OperationUpdate::Progress(progress_value(&event.payload)?),
        EventName::Message => OperationUpdate::Message(event.payload.text()),
        EventName::Log => OperationUpdate::Log(event.payload.text()),
        EventName::Restarting => OperationUpdate::Restarting(match &event.payload {
            EventPayload::Json(value) if !value.is_string() && value.get("message").is_none() => {
                "Restarting...".to_string()
            }
            payload => payload.text(),
        }),
        EventName::Error => {
            return Some(OperationEvent::Failed {
                code: event.payload.str_field("code").unwrap_or("ERROR").to_string(),
                message: match &event.payload {
                    EventPayload::Json(Value::Object(_)) => event
                        .payload
                        .str_field("message")
                        .unwrap_or("Unknown error")
                        .to_string(),
                    payload => payload.text(),
                },
            });
        }
        _ => return None,
    };
    Some(OperationEvent::Update(update))
}

fn progress_value(payload: &EventPayload) -> Option<f64> {
    match payload {
        EventPayload::Json(Value::Number(n)) => n.as_f64(),
        EventPayload::Json(value) => value.get("progress").and_then(Value::as_f64),
        EventPayload::Text(text) => text.trim().parse().ok(),
    }
}

/// A running operation and its feedback stream
pub struct OperationHandle {
    subscription: Subscription,
    events: mpsc::UnboundedReceiver<OperationEvent>,
}

impl OperationHandle {
    /// Open the feedback stream at `path`. The returned sender lets the caller
    /// inject a failure (e.g. from the triggering request) into the same channel.
    pub(crate) fn open(
        streams: &EventStreamClient,
        path: &str,
    ) -> Result<(Self, mpsc::UnboundedSender<OperationEvent>)> {
        let (tx, events) = mpsc::unbounded_channel();

        let event_tx = tx.clone();
        let error_tx = tx.clone();
        let close_tx = tx.clone();
        let handlers = StreamHandlers::new()
            .on_event(move |event| {
                if let Some(op_event) = classify(event) {
                    let _ = event_tx.send(op_event);
                }
            })
            .on_error(move |err| {
                let _ = error_tx.send(OperationEvent::Interrupted(err.to_string()));
            })
            .on_close(move || {
                let _ = close_tx.send(OperationEvent::Closed);
            });

        let subscription = streams.open_stream(path, handlers)?;
        Ok((
            Self {
                subscription,
                events,
            },
            tx,
        ))
    }

    pub fn path(&self) -> &str {
        self.subscription.path()
    }

    /// Stop following the operation. The board-side operation is not aborted.
    pub fn cancel(&self) {
        self.subscription.close();
    }

    /// Wait for the terminal status, discarding intermediate feedback
    pub async fn wait(self) -> OperationOutcome {
        self.wait_with(|_| {}).await
    }

    /// Wait for the terminal status, passing each update to `on_update`
    pub async fn wait_with<F>(mut self, mut on_update: F) -> OperationOutcome
    where
        F: FnMut(OperationUpdate),
    {
        let mut interrupted = None;

        while let Some(event) = self.events.recv().await {
            match event {
                OperationEvent::Update(update) => on_update(update),
                OperationEvent::Failed { code, message } => {
                    log::error!("{} failed: {} - {}", self.subscription.path(), code, message);
                    self.subscription.close();
                    return OperationOutcome::Failed { code, message };
                }
                OperationEvent::Interrupted(reason) => {
                    interrupted.get_or_insert(reason);
                }
                OperationEvent::Closed => break,
            }
        }

        match interrupted {
            Some(reason) => OperationOutcome::Interrupted(reason),
            None => OperationOutcome::Succeeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(name: EventName, payload: EventPayload) -> StreamEvent {
        StreamEvent { name, payload }
    }

    #[test]
    fn test_classify_progress_variants() {
        for payload in [
            EventPayload::Json(json!({"progress": 0.25})),
            EventPayload::Json(json!(0.25)),
            EventPayload::Text("0.25".into()),
        ] {
            match classify(event(EventName::Progress, payload)) {
                Some(OperationEvent::Update(OperationUpdate::Progress(p))) => assert_eq!(p, 0.25),
                other => panic!("Expected progress, got: {:?}", other),
            }
        }
        assert!(classify(event(EventName::Progress, EventPayload::Json(json!({})))).is_none());
    }

    #[test]
    fn test_classify_error_defaults() {
        match classify(event(EventName::Error, EventPayload::Json(json!({"code": "E_BUSY", "message": "app busy"})))) {
            Some(OperationEvent::Failed { code, message }) => {
                assert_eq!(code, "E_BUSY");
                assert_eq!(message, "app busy");
            }
            other => panic!("Expected failure, got: {:?}", other),
        }

        match classify(event(EventName::Error, EventPayload::Json(json!({})))) {
            Some(OperationEvent::Failed { code, message }) => {
                assert_eq!(code, "ERROR");
                assert_eq!(message, "Unknown error");
            }
            other => panic!("Expected failure, got: {:?}", other),
        }
    }

    #[test]
    fn test_classify_restarting_and_ignored_names() {
        match classify(event(EventName::Restarting, EventPayload::Json(json!({})))) {
            Some(OperationEvent::Update(OperationUpdate::Restarting(msg))) => {
                assert_eq!(msg, "Restarting...")
            }
            other => panic!("Expected restarting, got: {:?}", other),
        }
        assert!(classify(event(EventName::Cpu, EventPayload::Json(json!(12)))).is_none());
        assert!(classify(event(EventName::App, EventPayload::Json(json!({})))).is_none());
    }
}
