//! Typed REST client for the CodeGenie backend.
//!
//! DESIGN
//! ======
//! One async function per endpoint, grouped by controller (`user_api`,
//! `app_api`, `chat_history_api`). Each wrapper only shapes an
//! [`ApiRequest`](transport::ApiRequest) and decodes the
//! [`BaseResponse`](envelope::BaseResponse); execution, timeouts and cookies
//! belong to the [`Transport`](transport::Transport).
//!
//! ERROR HANDLING
//! ==============
//! Wrappers return `TransportError` only for transport/decoding failures.
//! Application failures arrive as an envelope with `code != 0`, untouched.

pub mod app_api;
pub mod chat_history_api;
pub mod envelope;
pub mod sse;
pub mod transport;
pub mod types;
pub mod user_api;

#[cfg(test)]
pub(crate) mod test_support;

use serde::de::DeserializeOwned;

use envelope::BaseResponse;
use transport::{ApiRequest, Transport, TransportError};

/// Execute `request` and decode the body as `BaseResponse<T>`.
pub(crate) async fn call<T: DeserializeOwned>(
    transport: &dyn Transport,
    request: ApiRequest,
) -> Result<BaseResponse<T>, TransportError> {
    let body = transport.send(request).await?;
    serde_json::from_value(body).map_err(|e| TransportError::Decode(e.to_string()))
}
