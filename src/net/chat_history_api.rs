//! `/chatHistory/*` endpoint wrappers.

use serde::Serialize;

use super::call;
use super::envelope::{BaseResponse, Page};
use super::transport::{ApiRequest, Transport, TransportError};
use super::types::{ChatHistory, ChatHistoryQueryRequest, ChatHistoryVo, DeleteRequest, IdParams, ListAppChatHistoryParams};

/// Page size sent by [`list_app_chat_history`] when the caller sets none.
pub const DEFAULT_APP_HISTORY_PAGE_SIZE: i64 = 10;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppHistoryQuery<'a> {
    page_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_create_time: Option<&'a str>,
}

/// `GET /chatHistory/app/{appId}?pageSize=&lastCreateTime=` — cursor page of
/// an app's conversation, newest first.
pub async fn list_app_chat_history(
    transport: &dyn Transport,
    params: &ListAppChatHistoryParams,
) -> Result<BaseResponse<Page<ChatHistory>>, TransportError> {
    let query = AppHistoryQuery {
        page_size: params.page_size.unwrap_or(DEFAULT_APP_HISTORY_PAGE_SIZE),
        last_create_time: params.last_create_time.as_deref(),
    };
    let request = ApiRequest::get(format!("/chatHistory/app/{}", params.app_id)).with_query(&query)?;
    call(transport, request).await
}

/// `DELETE /chatHistory/app/{appId}` — drop an app's whole conversation.
pub async fn delete_chat_history_by_app_id(
    transport: &dyn Transport,
    app_id: i64,
) -> Result<BaseResponse<bool>, TransportError> {
    call(transport, ApiRequest::delete(format!("/chatHistory/app/{app_id}"))).await
}

/// `POST /chatHistory/delete`
pub async fn delete_chat_history(
    transport: &dyn Transport,
    body: &DeleteRequest,
) -> Result<BaseResponse<bool>, TransportError> {
    call(transport, ApiRequest::post("/chatHistory/delete").with_json(body)?).await
}

/// `GET /chatHistory/get?id=`
pub async fn get_chat_history_by_id(
    transport: &dyn Transport,
    params: IdParams,
) -> Result<BaseResponse<ChatHistory>, TransportError> {
    call(transport, ApiRequest::get("/chatHistory/get").with_query(&params)?).await
}

/// `GET /chatHistory/get/vo?id=`
pub async fn get_chat_history_vo_by_id(
    transport: &dyn Transport,
    params: IdParams,
) -> Result<BaseResponse<ChatHistoryVo>, TransportError> {
    call(transport, ApiRequest::get("/chatHistory/get/vo").with_query(&params)?).await
}

/// `GET /chatHistory/latest/{appId}`
pub async fn get_latest_chat_history_by_app_id(
    transport: &dyn Transport,
    app_id: i64,
) -> Result<BaseResponse<Vec<ChatHistoryVo>>, TransportError> {
    call(transport, ApiRequest::get(format!("/chatHistory/latest/{app_id}"))).await
}

/// `POST /chatHistory/list/page/vo` (admin)
pub async fn list_chat_history_vo_by_page(
    transport: &dyn Transport,
    body: &ChatHistoryQueryRequest,
) -> Result<BaseResponse<Page<ChatHistoryVo>>, TransportError> {
    call(transport, ApiRequest::post("/chatHistory/list/page/vo").with_json(body)?).await
}

/// `POST /chatHistory/my/list/page/vo`
pub async fn list_my_chat_history_vo_by_page(
    transport: &dyn Transport,
    body: &ChatHistoryQueryRequest,
) -> Result<BaseResponse<Page<ChatHistoryVo>>, TransportError> {
    call(transport, ApiRequest::post("/chatHistory/my/list/page/vo").with_json(body)?).await
}

#[cfg(test)]
#[path = "chat_history_api_test.rs"]
mod tests;
