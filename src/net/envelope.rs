//! The `{code, data, message}` envelope wrapping every backend response, and
//! the page shape used by list endpoints.

use serde::{Deserialize, Serialize};

use super::transport::TransportError;
use super::types::{deserialize_i64_lenient, deserialize_i64_or_zero};

/// Backend status codes carried in [`BaseResponse::code`].
pub mod error_code {
    pub const SUCCESS: i32 = 0;
    pub const PARAMS_ERROR: i32 = 40000;
    pub const NOT_LOGIN_ERROR: i32 = 40100;
    pub const NO_AUTH_ERROR: i32 = 40101;
    pub const FORBIDDEN_ERROR: i32 = 40300;
    pub const NOT_FOUND_ERROR: i32 = 40400;
    pub const SYSTEM_ERROR: i32 = 50000;
    pub const OPERATION_ERROR: i32 = 50001;
}

/// Uniform response wrapper.
///
/// `code == 0` is success and only then is `data` meaningful. A body without
/// `code` fails to decode rather than being read as success.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseResponse<T> {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> BaseResponse<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == error_code::SUCCESS
    }

    /// The backend rejected the call because no user is logged in.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        self.code == error_code::NOT_LOGIN_ERROR
    }

    /// Non-empty server message, if any.
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }

    /// `data` when the call succeeded; `None` otherwise.
    #[must_use]
    pub fn success_data(self) -> Option<T> {
        if self.is_success() { self.data } else { None }
    }

    /// Split into success data or a business error.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] when `code != 0`, carrying the server
    /// message (or a generic one when the server sent none).
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.is_success() {
            return Ok(self.data);
        }
        let message = self
            .failure_message()
            .map_or_else(|| "request rejected by server".to_owned(), str::to_owned);
        Err(ApiError::Business { code: self.code, message })
    }
}

/// Either side of an API call failing.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{message} (code {code})")]
    Business { code: i32, message: String },
}

/// One page of records from a `list/page` endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    #[serde(default, deserialize_with = "deserialize_i64_or_zero")]
    pub page_number: i64,
    #[serde(default, deserialize_with = "deserialize_i64_or_zero")]
    pub page_size: i64,
    #[serde(default, deserialize_with = "deserialize_i64_or_zero")]
    pub total_page: i64,
    #[serde(default, deserialize_with = "deserialize_i64_or_zero")]
    pub total_row: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize_count_query: Option<bool>,
}

/// A bare id returned by `add`/`register` endpoints.
///
/// The backend serializes Java `Long`s either as numbers or as strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(#[serde(deserialize_with = "deserialize_i64_lenient")] pub i64);

#[cfg(test)]
#[path = "envelope_test.rs"]
mod tests;
