use futures_util::StreamExt;
use reqwest::Method;
use serde_json::json;

use super::*;
use crate::net::test_support::{MockTransport, error_envelope, ok_envelope};

fn data_event(data: &str) -> SseEvent {
    SseEvent { event: None, data: data.to_owned(), id: None }
}

fn done_event() -> SseEvent {
    SseEvent { event: Some("done".to_owned()), data: String::new(), id: None }
}

// =============================================================================
// REST endpoints
// =============================================================================

#[tokio::test]
async fn add_app_posts_init_prompt() {
    let transport = MockTransport::new();
    transport.push_json(ok_envelope(json!(77)));

    let body = AppAddRequest { init_prompt: Some("a portfolio site".to_owned()) };
    let resp = add_app(&transport, &body).await.unwrap();

    assert_eq!(resp.data, Some(Id(77)));
    let request = transport.last_request();
    assert_eq!((request.method.clone(), request.path.as_str()), (Method::POST, "/app/add"));
    assert_eq!(request.body, Some(json!({ "initPrompt": "a portfolio site" })));
}

#[tokio::test]
async fn owner_and_admin_endpoints_use_distinct_paths() {
    let transport = MockTransport::new();
    for _ in 0..4 {
        transport.push_json(ok_envelope(json!(true)));
    }

    delete_app(&transport, &DeleteRequest { id: Some(1) }).await.unwrap();
    update_app(&transport, &AppUpdateRequest { id: Some(1), app_name: Some("n".to_owned()) }).await.unwrap();
    delete_app_by_admin(&transport, &DeleteRequest { id: Some(1) }).await.unwrap();
    update_app_by_admin(&transport, &AppAdminUpdateRequest { id: Some(1), priority: Some(99), ..Default::default() })
        .await
        .unwrap();

    let requests = transport.requests();
    let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/app/delete", "/app/update", "/app/delete/admin", "/app/admin/update"]);
    assert!(requests.iter().all(|r| r.method == Method::POST));
    assert_eq!(requests[3].body, Some(json!({ "id": 1, "priority": 99 })));
}

#[tokio::test]
async fn get_endpoints_send_id_query() {
    let transport = MockTransport::new();
    transport.push_json(ok_envelope(json!({ "id": 3, "appName": "Todo", "user": { "id": 1 } })));
    transport.push_json(ok_envelope(json!({ "id": 3, "isDelete": 0 })));

    let vo = get_app_vo_by_id(&transport, IdParams { id: 3 }).await.unwrap();
    assert_eq!(vo.data.unwrap().app_name.as_deref(), Some("Todo"));
    let raw = get_app_by_id(&transport, IdParams { id: 3 }).await.unwrap();
    assert_eq!(raw.data.unwrap().is_delete, Some(0));

    let requests = transport.requests();
    assert_eq!(requests[0].path, "/app/get/vo");
    assert_eq!(requests[1].path, "/app/get");
    assert!(requests.iter().all(|r| r.method == Method::GET && r.query_value("id") == Some("3")));
}

#[tokio::test]
async fn page_endpoints_post_query_body() {
    let transport = MockTransport::new();
    let page = json!({ "records": [{ "id": 1 }], "pageNumber": 1, "pageSize": 12, "totalPage": 1, "totalRow": 1 });
    for _ in 0..3 {
        transport.push_json(ok_envelope(page.clone()));
    }

    let query = AppQueryRequest { page_num: Some(1), page_size: Some(12), ..AppQueryRequest::default() };
    list_my_app_vo_by_page(&transport, &query).await.unwrap();
    list_featured_app_vo_by_page(&transport, &query).await.unwrap();
    let admin = list_app_vo_by_page_admin(&transport, &query).await.unwrap();
    assert_eq!(admin.data.unwrap().records.len(), 1);

    let requests = transport.requests();
    let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/app/my/list/page/vo", "/app/list/page/vo/featured", "/app/list/page/vo/admin"]);
    assert!(requests.iter().all(|r| r.body == Some(json!({ "pageNum": 1, "pageSize": 12 }))));
}

#[tokio::test]
async fn deploy_app_returns_url() {
    let transport = MockTransport::new();
    transport.push_json(ok_envelope(json!("http://localhost/abc123/")));

    let resp = deploy_app(&transport, &AppDeployRequest { app_id: Some(5) }).await.unwrap();
    assert_eq!(resp.data.as_deref(), Some("http://localhost/abc123/"));
    assert_eq!(transport.last_request().body, Some(json!({ "appId": 5 })));
}

#[tokio::test]
async fn business_error_is_returned_as_envelope() {
    let transport = MockTransport::new();
    transport.push_json(error_envelope(40101, "no permission"));

    let resp = get_app_by_id(&transport, IdParams { id: 1 }).await.unwrap();
    assert!(!resp.is_success());
    assert_eq!(resp.failure_message(), Some("no permission"));
}

// =============================================================================
// Code generation stream
// =============================================================================

#[test]
fn gen_code_chunk_from_content_event() {
    let chunk = GenCodeChunk::from_event(&data_event(r#"{"d":"<div>"}"#)).unwrap();
    assert_eq!(chunk, GenCodeChunk::Content("<div>".to_owned()));
}

#[test]
fn gen_code_chunk_done_event() {
    assert_eq!(GenCodeChunk::from_event(&done_event()).unwrap(), GenCodeChunk::Done);
}

#[test]
fn gen_code_chunk_rejects_unwrapped_data() {
    let err = GenCodeChunk::from_event(&data_event("plain text")).unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}

#[tokio::test]
async fn chat_to_gen_code_streams_chunks_then_done() {
    let transport = MockTransport::new();
    transport.set_events(vec![data_event(r#"{"d":"<html>"}"#), data_event(r#"{"d":"</html>"}"#), done_event()]);

    let params = ChatToGenCodeParams { app_id: 8, message: "add a footer".to_owned() };
    let chunks: Vec<GenCodeChunk> = chat_to_gen_code(&transport, &params)
        .await
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await;

    assert_eq!(
        chunks,
        vec![
            GenCodeChunk::Content("<html>".to_owned()),
            GenCodeChunk::Content("</html>".to_owned()),
            GenCodeChunk::Done,
        ]
    );
    let request = transport.last_request();
    assert_eq!((request.method.clone(), request.path.as_str()), (Method::GET, "/app/chat/gen/code"));
    assert_eq!(request.query_value("appId"), Some("8"));
    assert_eq!(request.query_value("message"), Some("add a footer"));
}
