//! Board system information, updates, properties and resource metrics

use reqwest::Method;

use crate::errors::Result;
use crate::models::app::{ResourceEvent, ResourceKind, UpdateInfo, VersionInfo};
use crate::models::events::{EventName, EventPayload};
use crate::remote::{StreamHandlers, Subscription};
use crate::services::Orchestrator;
use crate::services::operation::{OperationEvent, OperationHandle};

pub struct SystemService<'a> {
    orchestrator: &'a Orchestrator,
}

impl<'a> SystemService<'a> {
    pub fn new(orchestrator: &'a Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn version(&self) -> Result<VersionInfo> {
        self.orchestrator.requests().get("/version", &[]).await
    }

    pub async fn check_updates(&self, only_arduino: bool) -> Result<UpdateInfo> {
        self.orchestrator
            .requests()
            .get("/system/update/check", only_arduino_query(only_arduino))
            .await
    }

    /// Apply pending updates.
    ///
    /// The feedback stream is opened before the apply request is fired so no
    /// event is missed. A failed apply request is reported as the operation's
    /// failure with code `REQUEST`.
    pub fn apply_updates(&self, only_arduino: bool) -> Result<OperationHandle> {
        let (handle, failures) =
            OperationHandle::open(self.orchestrator.streams(), "/system/update/events")?;

        let requests = self.orchestrator.requests().clone();
        tokio::spawn(async move {
            let fired: Result<serde_json::Value> = requests
                .request::<_, ()>(
                    Method::PUT,
                    "/system/update/apply",
                    None,
                    only_arduino_query(only_arduino),
                )
                .await;
            if let Err(e) = fired {
                log::error!("Update apply failed: {}", e);
                let _ = failures.send(OperationEvent::Failed {
                    code: "REQUEST".to_string(),
                    message: e.to_string(),
                });
            }
        });

        Ok(handle)
    }

    /// Follow cpu/mem/disk metrics. The caller owns the subscription.
    pub fn stream_resources<F>(&self, mut on_resource: F) -> Result<Subscription>
    where
        F: FnMut(ResourceEvent) + Send + 'static,
    {
        let handlers = StreamHandlers::new().on_event(move |event| {
            let kind = match event.name {
                EventName::Cpu => ResourceKind::Cpu,
                EventName::Mem => ResourceKind::Mem,
                EventName::Disk => ResourceKind::Disk,
                _ => return,
            };
            let data = match event.payload {
                EventPayload::Json(value) => value,
                EventPayload::Text(text) => serde_json::Value::String(text),
            };
            on_resource(ResourceEvent { kind, data });
        });
        self.orchestrator
            .streams()
            .open_stream("/system/resources", handlers)
    }

    pub async fn list_properties(&self) -> Result<Vec<String>> {
        self.orchestrator.requests().get("/properties", &[]).await
    }

    pub async fn get_property(&self, key: &str) -> Result<String> {
        self.orchestrator
            .requests()
            .get(&property_path(key), &[])
            .await
    }

    /// Store `value` under `key`. The value travels as raw text, not a JSON string.
    pub async fn set_property(&self, key: &str, value: &str) -> Result<()> {
        let _: Option<serde_json::Value> = self
            .orchestrator
            .requests()
            .put_text(&property_path(key), value)
            .await?;
        Ok(())
    }

    pub async fn delete_property(&self, key: &str) -> Result<()> {
        let _: Option<serde_json::Value> = self
            .orchestrator
            .requests()
            .delete(&property_path(key))
            .await?;
        Ok(())
    }

    /// Board display name, falling back to the product name when unset
    pub async fn board_name(&self) -> String {
        self.get_property("board.name")
            .await
            .unwrap_or_else(|_| "Arduino UNO Q".to_string())
    }
}

const ONLY_ARDUINO: &[(&str, &str)] = &[("only-arduino", "true")];

fn only_arduino_query(only_arduino: bool) -> &'static [(&'static str, &'static str)] {
    if only_arduino {
        ONLY_ARDUINO
    } else {
        &ONLY_ARDUINO[..0]
    }
}

fn property_path(key: &str) -> String {
    format!("/properties/{}", urlencoding::encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_keys_are_percent_encoded() {
        assert_eq!(property_path("board.name"), "/properties/board.name");
        assert_eq!(property_path("wifi/ssid name"), "/properties/wifi%2Fssid%20name");
    }

    #[test]
    fn test_only_arduino_query() {
        assert_eq!(only_arduino_query(true), &[("only-arduino", "true")]);
        assert!(only_arduino_query(false).is_empty());
    }
}
