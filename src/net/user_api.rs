//! `/user/*` endpoint wrappers.

use super::call;
use super::envelope::{BaseResponse, Id, Page};
use super::transport::{ApiRequest, Transport, TransportError};
use super::types::{
    DeleteRequest, IdParams, User, UserAddRequest, UserLoginRequest, UserQueryRequest, UserRegisterRequest,
    UserUpdateRequest, UserVo,
};

/// `POST /user/register` — returns the new user id.
pub async fn user_register(
    transport: &dyn Transport,
    body: &UserRegisterRequest,
) -> Result<BaseResponse<Id>, TransportError> {
    call(transport, ApiRequest::post("/user/register").with_json(body)?).await
}

/// `POST /user/login` — establishes the server session and returns the profile.
pub async fn user_login(
    transport: &dyn Transport,
    body: &UserLoginRequest,
) -> Result<BaseResponse<UserVo>, TransportError> {
    call(transport, ApiRequest::post("/user/login").with_json(body)?).await
}

/// `GET /user/get/login`
pub async fn get_login_user(transport: &dyn Transport) -> Result<BaseResponse<UserVo>, TransportError> {
    call(transport, ApiRequest::get("/user/get/login")).await
}

/// `POST /user/logout`
pub async fn user_logout(transport: &dyn Transport) -> Result<BaseResponse<bool>, TransportError> {
    call(transport, ApiRequest::post("/user/logout")).await
}

/// `POST /user/add` (admin)
pub async fn add_user(transport: &dyn Transport, body: &UserAddRequest) -> Result<BaseResponse<Id>, TransportError> {
    call(transport, ApiRequest::post("/user/add").with_json(body)?).await
}

/// `GET /user/get?id=` (admin)
pub async fn get_user_by_id(transport: &dyn Transport, params: IdParams) -> Result<BaseResponse<User>, TransportError> {
    call(transport, ApiRequest::get("/user/get").with_query(&params)?).await
}

/// `GET /user/get/vo?id=`
pub async fn get_user_vo_by_id(
    transport: &dyn Transport,
    params: IdParams,
) -> Result<BaseResponse<UserVo>, TransportError> {
    call(transport, ApiRequest::get("/user/get/vo").with_query(&params)?).await
}

/// `POST /user/delete` (admin)
pub async fn delete_user(transport: &dyn Transport, body: &DeleteRequest) -> Result<BaseResponse<bool>, TransportError> {
    call(transport, ApiRequest::post("/user/delete").with_json(body)?).await
}

/// `POST /user/update` (admin)
pub async fn update_user(
    transport: &dyn Transport,
    body: &UserUpdateRequest,
) -> Result<BaseResponse<bool>, TransportError> {
    call(transport, ApiRequest::post("/user/update").with_json(body)?).await
}

/// `POST /user/list/page/vo` (admin)
pub async fn list_user_vo_by_page(
    transport: &dyn Transport,
    body: &UserQueryRequest,
) -> Result<BaseResponse<Page<UserVo>>, TransportError> {
    call(transport, ApiRequest::post("/user/list/page/vo").with_json(body)?).await
}

#[cfg(test)]
#[path = "user_api_test.rs"]
mod tests;
