//! Queue-backed [`Transport`] for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::Value;

use super::sse::SseEvent;
use super::transport::{ApiRequest, EventStream, Transport, TransportError};

/// Replays queued responses in order and records every request it sees.
///
/// An empty queue answers with a network failure, so tests that forget to
/// queue a response fail loudly on the error path.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    events: Mutex<Vec<SseEvent>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_json(&self, body: Value) {
        self.responses.lock().unwrap().push_back(Ok(body));
    }

    pub(crate) fn push_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub(crate) fn set_events(&self, events: Vec<SseEvent>) {
        *self.events.lock().unwrap() = events;
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> ApiRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("no queued response".to_owned())))
    }

    async fn open_event_stream(&self, request: ApiRequest) -> Result<EventStream, TransportError> {
        self.requests.lock().unwrap().push(request);
        let events: Vec<Result<SseEvent, TransportError>> =
            self.events.lock().unwrap().drain(..).map(Ok).collect();
        Ok(futures_util::stream::iter(events).boxed())
    }
}

/// `{"code": 0, "data": data}`.
pub(crate) fn ok_envelope(data: Value) -> Value {
    serde_json::json!({ "code": 0, "data": data, "message": "ok" })
}

/// `{"code": code, "message": message}`.
pub(crate) fn error_envelope(code: i32, message: &str) -> Value {
    serde_json::json!({ "code": code, "data": null, "message": message })
}
