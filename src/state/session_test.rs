use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::net::test_support::{MockTransport, error_envelope, ok_envelope};
use crate::net::transport::TransportError;
use crate::storage::{MemoryStore, StorageError};

fn fixture() -> (SessionStore, Arc<MockTransport>, Arc<MemoryStore>) {
    let transport = Arc::new(MockTransport::new());
    let storage = Arc::new(MemoryStore::new());
    let session = SessionStore::new(transport.clone(), storage.clone());
    (session, transport, storage)
}

fn credentials() -> UserLoginRequest {
    UserLoginRequest { user_name: Some("alice".to_owned()), user_password: Some("pw12345678".to_owned()) }
}

fn alice_json(role: &str) -> serde_json::Value {
    json!({ "id": 1, "userName": "alice", "userAvatar": "https://img/a.png", "userRole": role })
}

/// Rejects every write; reads see nothing.
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::InvalidKey(key.to_owned()))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Err(StorageError::InvalidKey(key.to_owned()))
    }
}

// =============================================================================
// initialize
// =============================================================================

#[test]
fn initialize_restores_stored_profile() {
    let (mut session, _, storage) = fixture();
    storage.set(USER_INFO_KEY, r#"{"id":"7","userName":"bob","userRole":"user"}"#).unwrap();

    session.initialize();

    assert!(session.is_logged_in());
    assert_eq!(session.user().unwrap().id, Some(7));
    assert_eq!(session.display_name(), "bob");
}

#[test]
fn initialize_discards_corrupt_value() {
    let (mut session, _, storage) = fixture();
    storage.set(USER_INFO_KEY, "{not json").unwrap();

    session.initialize();

    assert!(!session.is_logged_in());
    assert_eq!(storage.get(USER_INFO_KEY).unwrap(), None);
}

#[test]
fn initialize_runs_once() {
    let (mut session, _, storage) = fixture();
    session.initialize();

    storage.set(USER_INFO_KEY, r#"{"id":1}"#).unwrap();
    session.initialize();

    assert!(!session.is_logged_in());
}

#[test]
fn initialize_with_empty_storage_leaves_session_empty() {
    let (mut session, _, _) = fixture();
    session.initialize();
    assert!(session.user().is_none());
    assert_eq!(session.avatar_ref(), "");
}

// =============================================================================
// login / register
// =============================================================================

#[tokio::test]
async fn login_success_persists_and_restores_in_fresh_store() {
    let (mut session, transport, storage) = fixture();
    transport.push_json(ok_envelope(alice_json("user")));

    let user = session.login(&credentials()).await.unwrap();

    assert_eq!(user.user_name.as_deref(), Some("alice"));
    assert!(session.is_logged_in());
    assert_eq!(session.avatar_ref(), "https://img/a.png");

    let mut restored = SessionStore::new(transport.clone(), storage.clone());
    restored.initialize();
    assert_eq!(restored.user(), session.user());
}

#[tokio::test]
async fn login_rejected_carries_server_message() {
    let (mut session, transport, storage) = fixture();
    transport.push_json(error_envelope(40000, "wrong password"));

    let err = session.login(&credentials()).await.unwrap_err();

    assert_eq!(err, SessionFailure::Rejected { code: 40000, message: "wrong password".to_owned() });
    assert!(!session.is_logged_in());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn login_rejected_without_message_uses_fallback() {
    let (mut session, transport, _) = fixture();
    transport.push_json(json!({ "code": 50000 }));

    let err = session.login(&credentials()).await.unwrap_err();
    assert_eq!(err.message(), "login failed");
}

#[tokio::test]
async fn login_success_without_data_is_rejected() {
    let (mut session, transport, _) = fixture();
    transport.push_json(json!({ "code": 0, "data": null }));

    let err = session.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, SessionFailure::Rejected { code: 0, .. }));
    assert!(!session.is_logged_in());
}

#[tokio::test]
async fn login_network_failure() {
    let (mut session, transport, _) = fixture();
    transport.push_error(TransportError::Request("connection refused".to_owned()));

    let err = session.login(&credentials()).await.unwrap_err();
    assert_eq!(
        err,
        SessionFailure::Network { message: "login failed, please check your network connection".to_owned() }
    );
}

#[tokio::test]
async fn login_survives_storage_write_failure() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(ok_envelope(alice_json("user")));
    let mut session = SessionStore::new(transport, Arc::new(ReadOnlyStore));

    session.login(&credentials()).await.unwrap();
    assert!(session.is_logged_in());
}

#[tokio::test]
async fn register_returns_id_without_session() {
    let (mut session, transport, storage) = fixture();
    transport.push_json(ok_envelope(json!("42")));

    let id = session.register(&UserRegisterRequest::default()).await.unwrap();

    assert_eq!(id, Some(42));
    assert!(!session.is_logged_in());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn register_failures_use_registration_messages() {
    let (mut session, transport, _) = fixture();
    transport.push_json(json!({ "code": 40000, "message": "  " }));
    transport.push_error(TransportError::Request("timeout".to_owned()));

    let rejected = session.register(&UserRegisterRequest::default()).await.unwrap_err();
    assert_eq!(rejected.message(), "registration failed");
    let network = session.register(&UserRegisterRequest::default()).await.unwrap_err();
    assert_eq!(network.message(), "registration failed, please check your network connection");
}

// =============================================================================
// logout / fetch_current_user / clear
// =============================================================================

#[tokio::test]
async fn logout_clears_session_on_success() {
    let (mut session, transport, storage) = fixture();
    transport.push_json(ok_envelope(alice_json("user")));
    transport.push_json(ok_envelope(json!(true)));
    session.login(&credentials()).await.unwrap();

    session.logout().await;

    assert!(!session.is_logged_in());
    assert!(storage.is_empty());
    assert_eq!(transport.last_request().path, "/user/logout");
}

#[tokio::test]
async fn logout_clears_session_on_transport_failure() {
    let (mut session, transport, storage) = fixture();
    transport.push_json(ok_envelope(alice_json("user")));
    transport.push_error(TransportError::Request("offline".to_owned()));
    session.login(&credentials()).await.unwrap();

    session.logout().await;

    assert!(!session.is_logged_in());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn logout_clears_session_on_rejection() {
    let (mut session, transport, _) = fixture();
    transport.push_json(ok_envelope(alice_json("user")));
    transport.push_json(error_envelope(40100, "not logged in"));
    session.login(&credentials()).await.unwrap();

    session.logout().await;
    assert!(!session.is_logged_in());
}

#[tokio::test]
async fn fetch_current_user_saves_profile() {
    let (mut session, transport, storage) = fixture();
    transport.push_json(ok_envelope(alice_json("admin")));

    let user = session.fetch_current_user().await;

    assert_eq!(user.and_then(|u| u.id), Some(1));
    assert!(session.is_admin());
    assert!(storage.get(USER_INFO_KEY).unwrap().is_some());
}

#[tokio::test]
async fn fetch_current_user_clears_on_not_logged_in() {
    let (mut session, transport, storage) = fixture();
    transport.push_json(ok_envelope(alice_json("user")));
    transport.push_json(error_envelope(40100, "not logged in"));
    session.login(&credentials()).await.unwrap();

    assert_eq!(session.fetch_current_user().await, None);
    assert!(!session.is_logged_in());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn fetch_current_user_clears_on_network_failure() {
    let (mut session, transport, _) = fixture();
    transport.push_error(TransportError::Request("offline".to_owned()));

    assert_eq!(session.fetch_current_user().await, None);
    assert!(!session.is_logged_in());
}

#[test]
fn clear_marks_store_initialized() {
    let (mut session, _, storage) = fixture();
    storage.set(USER_INFO_KEY, r#"{"id":1}"#).unwrap();

    session.clear();
    session.initialize();

    assert!(!session.is_logged_in());
    assert!(storage.is_empty());
}

// =============================================================================
// update_profile
// =============================================================================

#[test]
fn update_profile_without_session_is_noop() {
    let (mut session, _, storage) = fixture();

    session.update_profile(ProfilePatch { user_name: Some("ghost".to_owned()), ..ProfilePatch::default() });

    assert!(session.user().is_none());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn update_profile_merges_and_persists() {
    let (mut session, transport, storage) = fixture();
    transport.push_json(ok_envelope(alice_json("user")));
    session.login(&credentials()).await.unwrap();

    session.update_profile(ProfilePatch { user_profile: Some("hello".to_owned()), ..ProfilePatch::default() });

    let user = session.user().unwrap();
    assert_eq!(user.user_profile.as_deref(), Some("hello"));
    assert_eq!(user.user_name.as_deref(), Some("alice"));
    let stored: UserVo = serde_json::from_str(&storage.get(USER_INFO_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored.user_profile.as_deref(), Some("hello"));
}

// =============================================================================
// derived flags
// =============================================================================

#[tokio::test]
async fn is_admin_requires_exact_role() {
    for (role, expected) in [("admin", true), ("user", false), ("Admin", false), ("admin ", false), ("", false)] {
        let (mut session, transport, _) = fixture();
        transport.push_json(ok_envelope(alice_json(role)));
        session.login(&credentials()).await.unwrap();
        assert_eq!(session.is_admin(), expected, "role {role:?}");
        assert_eq!(session.flags(), AuthFlags { logged_in: true, admin: expected });
    }
}

#[tokio::test]
async fn profile_without_role_is_not_admin() {
    let (mut session, transport, _) = fixture();
    transport.push_json(ok_envelope(json!({ "id": 1, "userName": "alice" })));

    session.login(&credentials()).await.unwrap();

    assert!(session.is_logged_in());
    assert!(!session.is_admin());
    assert_eq!(session.flags(), AuthFlags { logged_in: true, admin: false });
}

#[test]
fn flags_for_empty_session() {
    let (session, _, _) = fixture();
    assert_eq!(session.flags(), AuthFlags { logged_in: false, admin: false });
    assert_eq!(session.display_name(), "");
}
