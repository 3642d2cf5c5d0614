//! Push-event types delivered by the orchestrator's event streams

use serde_json::Value;

/// The closed set of event names the stream client routes.
/// Unnamed messages arrive as [`EventName::Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Progress,
    Message,
    Error,
    Log,
    Cpu,
    Mem,
    Disk,
    App,
    Restarting,
}

impl EventName {
    pub const ALL: [EventName; 9] = [
        EventName::Progress,
        EventName::Message,
        EventName::Error,
        EventName::Log,
        EventName::Cpu,
        EventName::Mem,
        EventName::Disk,
        EventName::App,
        EventName::Restarting,
    ];

    /// Map an SSE `event:` field to a known name; `None` for unregistered names
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "progress" => Some(EventName::Progress),
            "message" => Some(EventName::Message),
            "error" => Some(EventName::Error),
            "log" => Some(EventName::Log),
            "cpu" => Some(EventName::Cpu),
            "mem" => Some(EventName::Mem),
            "disk" => Some(EventName::Disk),
            "app" => Some(EventName::App),
            "restarting" => Some(EventName::Restarting),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Progress => "progress",
            EventName::Message => "message",
            EventName::Error => "error",
            EventName::Log => "log",
            EventName::Cpu => "cpu",
            EventName::Mem => "mem",
            EventName::Disk => "disk",
            EventName::App => "app",
            EventName::Restarting => "restarting",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event data: structured when it parsed as JSON, raw text otherwise
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Json(Value),
    Text(String),
}

impl EventPayload {
    pub fn decode(data: &str) -> Self {
        match serde_json::from_str::<Value>(data) {
            Ok(value) => EventPayload::Json(value),
            Err(_) => EventPayload::Text(data.to_string()),
        }
    }

    /// Look up a string field of a JSON object payload
    pub fn str_field(&self, key: &str) -> Option<&str> {
        match self {
            EventPayload::Json(value) => value.get(key).and_then(Value::as_str),
            EventPayload::Text(_) => None,
        }
    }

    /// Raw text or a JSON string as-is, any other JSON compacted
    pub fn to_line(&self) -> String {
        match self {
            EventPayload::Text(text) => text.clone(),
            EventPayload::Json(Value::String(s)) => s.clone(),
            EventPayload::Json(value) => value.to_string(),
        }
    }

    /// Human-readable text: raw text, a JSON string, the `message` field, or compact JSON
    pub fn text(&self) -> String {
        match self {
            EventPayload::Text(text) => text.clone(),
            EventPayload::Json(Value::String(s)) => s.clone(),
            EventPayload::Json(value) => value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
        }
    }
}

/// One dispatched push event
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub name: EventName,
    pub payload: EventPayload,
}

impl StreamEvent {
    /// Decode-and-route: resolve the event name (default channel when absent)
    /// and decode the payload. Unregistered names yield `None`.
    pub fn decode(event: Option<&str>, data: &str) -> Option<Self> {
        let name = match event {
            None | Some("") => EventName::Message,
            Some(name) => EventName::parse(name)?,
        };
        Some(StreamEvent {
            name,
            payload: EventPayload::decode(data),
        })
    }
}
