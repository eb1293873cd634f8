//! HTTP transport behind the endpoint wrappers.
//!
//! DESIGN
//! ======
//! Endpoint functions describe requests as plain [`ApiRequest`] values and hand
//! them to a [`Transport`]. [`HttpTransport`] executes them with `reqwest`,
//! keeping the backend's session cookie in a shared jar; tests substitute a
//! queue-backed mock.
//!
//! TRADE-OFFS
//! ==========
//! Responses cross the seam as `serde_json::Value` so the trait stays object
//! safe; typed decoding happens once in `net::call`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::ACCEPT;
use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::Value;

use super::sse::{SseDecoder, SseEvent};
use crate::config::ClientConfig;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced below the envelope layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The configured base URL could not be parsed.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// Request parameters or body could not be serialized.
    #[error("request encode failed: {0}")]
    Encode(String),

    /// Connecting, sending, or reading the body failed.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-2xx status.
    #[error("unexpected HTTP status {status}")]
    Status { status: u16, body: String },

    /// The body was not the expected JSON shape.
    #[error("response decode failed: {0}")]
    Decode(String),
}

/// Server-sent events as they arrive.
pub type EventStream = BoxStream<'static, Result<SseEvent, TransportError>>;

// =============================================================================
// REQUEST DESCRIPTION
// =============================================================================

/// A transport-neutral description of one API call.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    /// JSON body; only POST endpoints carry one.
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append the top-level fields of `params` as query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Encode`] if `params` does not serialize to a
    /// JSON object.
    pub fn with_query<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self, TransportError> {
        self.query.extend(query_pairs(params)?);
        Ok(self)
    }

    /// Attach `body` as the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Encode`] if `body` cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, TransportError> {
        let value = serde_json::to_value(body).map_err(|e| TransportError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Value of the first query parameter named `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Flatten a serializable parameter struct into query pairs.
///
/// `null` fields are skipped; strings are used verbatim and other scalars use
/// their JSON text.
pub(crate) fn query_pairs<T: Serialize + ?Sized>(params: &T) -> Result<Vec<(String, String)>, TransportError> {
    let value = serde_json::to_value(params).map_err(|e| TransportError::Encode(e.to_string()))?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect()),
        other => Err(TransportError::Encode(format!("query parameters must be an object, got {other}"))),
    }
}

/// Join the base URL and an endpoint path.
pub(crate) fn endpoint_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') { format!("{base}{path}") } else { format!("{base}/{path}") }
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// Executes [`ApiRequest`]s. Enables mocking in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the decoded JSON body of a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] for network failures, non-2xx statuses, or
    /// non-JSON bodies.
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;

    /// Open a `text/event-stream` response and yield its events.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the stream cannot be opened; errors
    /// while reading arrive as stream items.
    async fn open_event_stream(&self, request: ApiRequest) -> Result<EventStream, TransportError>;
}

// =============================================================================
// REQWEST IMPLEMENTATION
// =============================================================================

pub struct HttpTransport {
    http: reqwest::Client,
    base: String,
    base_url: Url,
    cookies: Arc<Jar>,
    stream_timeout: Duration,
}

impl HttpTransport {
    /// Build a transport for `config.base_url` with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails to
    /// build.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let base = config.base_url.trim_end_matches('/').to_owned();
        let base_url =
            Url::parse(&base).map_err(|e| TransportError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|e| TransportError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base,
            base_url,
            cookies,
            stream_timeout: Duration::from_secs(config.timeouts.stream_secs),
        })
    }

    /// Cookies the jar would send to the backend, as a `Cookie` header value.
    #[must_use]
    pub fn export_cookies(&self) -> Option<String> {
        let header = self.cookies.cookies(&self.base_url)?;
        header.to_str().ok().map(str::to_owned)
    }

    /// Seed the jar from a value previously returned by
    /// [`export_cookies`](Self::export_cookies).
    pub fn import_cookies(&self, raw: &str) {
        for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.cookies.add_cookie_str(pair, &self.base_url);
        }
    }

    fn build(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let url = endpoint_url(&self.base, &request.path);
        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        tracing::debug!(method = %request.method, path = %request.path, "api request");

        let response = self
            .build(&request)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(TransportError::Status { status, body: text });
        }

        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn open_event_stream(&self, request: ApiRequest) -> Result<EventStream, TransportError> {
        tracing::debug!(method = %request.method, path = %request.path, "api event stream");

        let response = self
            .build(&request)
            .header(ACCEPT, "text/event-stream")
            .timeout(self.stream_timeout)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        Ok(decode_event_stream(response.bytes_stream().boxed()))
    }
}

struct StreamState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    finished: bool,
}

/// Turn a body byte stream into decoded events. A read error ends the stream
/// after being yielded once.
pub(crate) fn decode_event_stream<S, B, E>(bytes: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = StreamState { bytes, decoder: SseDecoder::new(), pending: VecDeque::new(), finished: false };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.pending.extend(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(TransportError::Request(e.to_string())), state));
                }
                None => {
                    state.finished = true;
                    let events = state.decoder.finish();
                    state.pending.extend(events);
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
