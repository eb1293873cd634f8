//! `/app/*` endpoint wrappers, including the code-generation event stream.

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Deserialize;

use super::call;
use super::envelope::{BaseResponse, Id, Page};
use super::sse::SseEvent;
use super::transport::{ApiRequest, Transport, TransportError};
use super::types::{
    App, AppAddRequest, AppAdminUpdateRequest, AppDeployRequest, AppQueryRequest, AppUpdateRequest, AppVo,
    ChatToGenCodeParams, DeleteRequest, IdParams,
};

const DONE_EVENT: &str = "done";

/// `POST /app/add` — creates an app from its initial prompt, returning its id.
pub async fn add_app(transport: &dyn Transport, body: &AppAddRequest) -> Result<BaseResponse<Id>, TransportError> {
    call(transport, ApiRequest::post("/app/add").with_json(body)?).await
}

/// `POST /app/delete` — owner delete.
pub async fn delete_app(transport: &dyn Transport, body: &DeleteRequest) -> Result<BaseResponse<bool>, TransportError> {
    call(transport, ApiRequest::post("/app/delete").with_json(body)?).await
}

/// `POST /app/update` — owner rename.
pub async fn update_app(
    transport: &dyn Transport,
    body: &AppUpdateRequest,
) -> Result<BaseResponse<bool>, TransportError> {
    call(transport, ApiRequest::post("/app/update").with_json(body)?).await
}

/// `GET /app/get/vo?id=`
pub async fn get_app_vo_by_id(transport: &dyn Transport, params: IdParams) -> Result<BaseResponse<AppVo>, TransportError> {
    call(transport, ApiRequest::get("/app/get/vo").with_query(&params)?).await
}

/// `POST /app/my/list/page/vo`
pub async fn list_my_app_vo_by_page(
    transport: &dyn Transport,
    body: &AppQueryRequest,
) -> Result<BaseResponse<Page<AppVo>>, TransportError> {
    call(transport, ApiRequest::post("/app/my/list/page/vo").with_json(body)?).await
}

/// `POST /app/list/page/vo/featured`
pub async fn list_featured_app_vo_by_page(
    transport: &dyn Transport,
    body: &AppQueryRequest,
) -> Result<BaseResponse<Page<AppVo>>, TransportError> {
    call(transport, ApiRequest::post("/app/list/page/vo/featured").with_json(body)?).await
}

/// `GET /app/get?id=` (admin)
pub async fn get_app_by_id(transport: &dyn Transport, params: IdParams) -> Result<BaseResponse<App>, TransportError> {
    call(transport, ApiRequest::get("/app/get").with_query(&params)?).await
}

/// `POST /app/delete/admin` (admin)
pub async fn delete_app_by_admin(
    transport: &dyn Transport,
    body: &DeleteRequest,
) -> Result<BaseResponse<bool>, TransportError> {
    call(transport, ApiRequest::post("/app/delete/admin").with_json(body)?).await
}

/// `POST /app/admin/update` (admin)
pub async fn update_app_by_admin(
    transport: &dyn Transport,
    body: &AppAdminUpdateRequest,
) -> Result<BaseResponse<bool>, TransportError> {
    call(transport, ApiRequest::post("/app/admin/update").with_json(body)?).await
}

/// `POST /app/list/page/vo/admin` (admin)
pub async fn list_app_vo_by_page_admin(
    transport: &dyn Transport,
    body: &AppQueryRequest,
) -> Result<BaseResponse<Page<AppVo>>, TransportError> {
    call(transport, ApiRequest::post("/app/list/page/vo/admin").with_json(body)?).await
}

/// `POST /app/deploy` — returns the public URL of the deployed site.
pub async fn deploy_app(
    transport: &dyn Transport,
    body: &AppDeployRequest,
) -> Result<BaseResponse<String>, TransportError> {
    call(transport, ApiRequest::post("/app/deploy").with_json(body)?).await
}

// =============================================================================
// CODE GENERATION STREAM
// =============================================================================

/// One decoded event of the code-generation stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenCodeChunk {
    /// A fragment of generated output, in arrival order.
    Content(String),
    /// The server finished generating; no further chunks follow.
    Done,
}

#[derive(Deserialize)]
struct ContentWrapper {
    d: String,
}

impl GenCodeChunk {
    /// Decode an SSE event. Content events carry `{"d": "<chunk>"}`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] if a content event's data is not
    /// the expected wrapper.
    pub fn from_event(event: &SseEvent) -> Result<Self, TransportError> {
        if event.event.as_deref() == Some(DONE_EVENT) {
            return Ok(Self::Done);
        }
        let wrapper: ContentWrapper =
            serde_json::from_str(&event.data).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(Self::Content(wrapper.d))
    }
}

/// `GET /app/chat/gen/code?appId=&message=` — stream generated code for a
/// chat message.
///
/// # Errors
///
/// Returns an error if the stream cannot be opened; per-event failures are
/// stream items.
pub async fn chat_to_gen_code(
    transport: &dyn Transport,
    params: &ChatToGenCodeParams,
) -> Result<BoxStream<'static, Result<GenCodeChunk, TransportError>>, TransportError> {
    let request = ApiRequest::get("/app/chat/gen/code").with_query(params)?;
    let events = transport.open_event_stream(request).await?;
    Ok(events
        .map(|event| event.and_then(|e| GenCodeChunk::from_event(&e)))
        .boxed())
}

#[cfg(test)]
#[path = "app_api_test.rs"]
mod tests;
