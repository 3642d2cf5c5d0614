//! Versioned HTTP requests against the connected board's orchestrator

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::{LinkError, Result};
use crate::session::ConnectionSession;

/// Path prefix of every orchestrator endpoint
pub const API_VERSION: &str = "/v1";

/// Full endpoint URL for `path` under `base`
pub fn api_url(base: &str, path: &str) -> String {
    format!("{}{}{}", base.trim_end_matches('/'), API_VERSION, path)
}

/// Issues single-attempt requests; never retries
#[derive(Clone)]
pub struct RequestClient {
    http: Client,
    session: Arc<ConnectionSession>,
    timeout: Option<Duration>,
}

impl RequestClient {
    pub fn new(session: Arc<ConnectionSession>) -> Self {
        Self {
            http: Client::new(),
            session,
            timeout: None,
        }
    }

    /// Abort requests that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn session(&self) -> &Arc<ConnectionSession> {
        &self.session
    }

    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = body.map(serde_json::to_value).transpose()?.map(Payload::Json);
        self.execute(method, path, body, query).await
    }

    /// Like [`request`](Self::request), aborted with `LinkError::Cancelled` once `cancel` fires
    pub async fn request_cancellable<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        if self.session.base_url().is_none() {
            return Err(LinkError::NotConnected);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!("{} {} cancelled", method, path);
                Err(LinkError::Cancelled)
            }
            result = self.request(method.clone(), path, body, query) => result,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.execute(Method::GET, path, None, query).await
    }

    pub async fn post<T, B>(&self, path: &str, body: Option<&B>, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, body, query).await
    }

    pub async fn put<T, B>(&self, path: &str, body: Option<&B>, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, body, query).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body), &[]).await
    }

    /// PUT `text` as a raw `text/plain` body
    pub async fn put_text<T: DeserializeOwned>(&self, path: &str, text: &str) -> Result<T> {
        self.execute(Method::PUT, path, Some(Payload::Text(text.to_string())), &[])
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(Method::DELETE, path, None, &[]).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Payload>,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let base = self.session.base_url().ok_or(LinkError::NotConnected)?;
        let url = api_url(&base, path);
        log::debug!("{} {}", method, path);

        let mut builder = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        builder = match body {
            Some(Payload::Json(value)) => builder.json(&value),
            Some(Payload::Text(text)) => builder.header(CONTENT_TYPE, "text/plain").body(text),
            None => builder,
        };
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;

        if !status.is_success() {
            let err = remote_error(status, &bytes);
            log::error!("HTTP {} {} failed: {}", method, path, err);
            return Err(err);
        }

        decode_body(&bytes)
    }
}

fn map_transport_error(err: reqwest::Error) -> LinkError {
    if err.is_timeout() {
        LinkError::Timeout
    } else {
        LinkError::Http(err)
    }
}

/// Build a `Remote` error from a failed response, preferring the body's
/// `message` or `error` field over the status line
pub fn remote_error(status: StatusCode, body: &[u8]) -> LinkError {
    let from_body = serde_json::from_slice::<Value>(body).ok().and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
    });

    LinkError::Remote {
        status: status.as_u16(),
        message: from_body.unwrap_or_else(|| status.to_string()),
    }
}

/// Request payload encodings the orchestrator accepts
enum Payload {
    Json(Value),
    Text(String),
}

/// Decode a success body. An empty body decodes as JSON `null`; a body that is
/// not JSON is retried as a JSON string holding the raw text.
fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_str("null")?);
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(e) => {
            let text = Value::String(String::from_utf8_lossy(bytes).into_owned());
            serde_json::from_value(text).map_err(|_| LinkError::Serialization(e))
        }
    }
}
