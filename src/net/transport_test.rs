use futures_util::StreamExt;
use serde::Serialize;

use super::*;
use crate::config::{ClientConfig, Timeouts};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SampleParams {
    app_id: i64,
    message: String,
    page_size: Option<i64>,
    featured: bool,
}

fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_owned(),
        storage_dir: std::env::temp_dir(),
        timeouts: Timeouts::default(),
    }
}

// =============================================================================
// query_pairs
// =============================================================================

#[test]
fn query_pairs_flattens_scalars_and_skips_null() {
    let params = SampleParams { app_id: 42, message: "make a todo app".to_owned(), page_size: None, featured: true };
    let pairs = query_pairs(&params).unwrap();
    // serde_json maps iterate in key order.
    assert_eq!(
        pairs,
        vec![
            ("appId".to_owned(), "42".to_owned()),
            ("featured".to_owned(), "true".to_owned()),
            ("message".to_owned(), "make a todo app".to_owned()),
        ]
    );
}

#[test]
fn query_pairs_unit_is_empty() {
    assert!(query_pairs(&()).unwrap().is_empty());
}

#[test]
fn query_pairs_rejects_non_object() {
    let err = query_pairs(&vec![1, 2]).unwrap_err();
    assert!(matches!(err, TransportError::Encode(_)));
}

// =============================================================================
// ApiRequest
// =============================================================================

#[test]
fn api_request_builders_set_method_and_path() {
    assert_eq!(ApiRequest::get("/user/get").method, Method::GET);
    assert_eq!(ApiRequest::post("/user/login").method, Method::POST);
    assert_eq!(ApiRequest::delete("/chatHistory/app/1").method, Method::DELETE);
    assert_eq!(ApiRequest::get("/user/get").path, "/user/get");
}

#[test]
fn api_request_with_json_sets_body() {
    let request = ApiRequest::post("/app/add")
        .with_json(&serde_json::json!({ "initPrompt": "hello" }))
        .unwrap();
    assert_eq!(request.body, Some(serde_json::json!({ "initPrompt": "hello" })));
    assert!(request.query.is_empty());
}

#[test]
fn api_request_query_value_finds_first_match() {
    let request = ApiRequest::get("/app/get").with_query(&serde_json::json!({ "id": 9 })).unwrap();
    assert_eq!(request.query_value("id"), Some("9"));
    assert_eq!(request.query_value("missing"), None);
}

// =============================================================================
// endpoint_url
// =============================================================================

#[test]
fn endpoint_url_joins_with_single_slash() {
    assert_eq!(endpoint_url("http://h/api", "/user/login"), "http://h/api/user/login");
    assert_eq!(endpoint_url("http://h/api/", "/user/login"), "http://h/api/user/login");
    assert_eq!(endpoint_url("http://h/api", "user/login"), "http://h/api/user/login");
}

// =============================================================================
// HttpTransport
// =============================================================================

#[test]
fn http_transport_rejects_invalid_base_url() {
    let err = HttpTransport::new(&test_config("not a url")).err().unwrap();
    assert!(matches!(err, TransportError::InvalidBaseUrl(_)));
}

#[test]
fn http_transport_cookie_import_export_round_trip() {
    let transport = HttpTransport::new(&test_config("http://localhost:8123/api")).unwrap();
    assert_eq!(transport.export_cookies(), None);
    transport.import_cookies("JSESSIONID=abc123");
    assert_eq!(transport.export_cookies().as_deref(), Some("JSESSIONID=abc123"));
}

// =============================================================================
// decode_event_stream
// =============================================================================

#[tokio::test]
async fn decode_event_stream_yields_events_across_chunks() {
    let chunks: Vec<Result<Vec<u8>, String>> = vec![
        Ok(b"data:{\"d\":\"<ht".to_vec()),
        Ok(b"ml>\"}\n\nevent:done\n".to_vec()),
        Ok(b"data:\n\n".to_vec()),
    ];
    let events: Vec<_> = decode_event_stream(futures_util::stream::iter(chunks))
        .collect()
        .await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].as_ref().unwrap().data, r#"{"d":"<html>"}"#);
    assert_eq!(events[1].as_ref().unwrap().event.as_deref(), Some("done"));
}

#[tokio::test]
async fn decode_event_stream_flushes_tail_at_end() {
    let chunks: Vec<Result<Vec<u8>, String>> = vec![Ok(b"data: last".to_vec())];
    let events: Vec<_> = decode_event_stream(futures_util::stream::iter(chunks))
        .collect()
        .await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].as_ref().unwrap().data, "last");
}

#[tokio::test]
async fn decode_event_stream_read_error_ends_stream() {
    let chunks: Vec<Result<Vec<u8>, String>> =
        vec![Ok(b"data: a\n\n".to_vec()), Err("connection reset".to_owned()), Ok(b"data: b\n\n".to_vec())];
    let events: Vec<_> = decode_event_stream(futures_util::stream::iter(chunks))
        .collect()
        .await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].as_ref().unwrap().data, "a");
    assert!(matches!(&events[1], Err(TransportError::Request(msg)) if msg == "connection reset"));
}
