use auth::*;
use httptest::{matchers::*, responders::*, Expectation};
use mocks::{expect_password_grant, session_body, store_server, ANON_KEY};
use serde_json::json;
use serial_test::serial;

fn expired_session() -> Session {
    Session {
        access_token: "old".into(),
        refresh_token: Some("refresh-token".into()),
        expires_at: 0,
        user: SessionUser {
            id: "user-1".into(),
            email: Some("admin@example.com".into()),
            user_metadata: json!({}),
        },
    }
}

#[tokio::test]
async fn sign_in_stores_session() {
    let server = store_server();
    expect_password_grant(&server, "fresh");
    let client = AuthClient::new(server.url_str(""), ANON_KEY, Box::new(MemoryStore::default()));

    let session = client.sign_in("admin@example.com", "secret").await.unwrap();
    assert_eq!(session.access_token, "fresh");
    assert_eq!(session.user.display_name(), "Admin");

    let current = client.get_session().await.unwrap().unwrap();
    assert_eq!(current.access_token, "fresh");
}

#[tokio::test]
async fn sign_in_reports_service_message() {
    let server = store_server();
    server.expect(
        Expectation::matching(request::method_path("POST", "/auth/v1/token")).respond_with(
            status_code(400).body(
                json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })
                    .to_string(),
            ),
        ),
    );
    let client = AuthClient::new(server.url_str(""), ANON_KEY, Box::new(MemoryStore::default()));
    let err = client.sign_in("admin@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Auth Error (400): Invalid login credentials");
    assert!(client.store().load().unwrap().is_none());
}

#[tokio::test]
async fn expired_session_is_refreshed() {
    let server = store_server();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/auth/v1/token"),
            request::query(url_decoded(contains(("grant_type", "refresh_token")))),
            request::body(json_decoded(eq(json!({ "refresh_token": "refresh-token" })))),
        ])
        .respond_with(json_encoded(session_body("renewed", 3600))),
    );
    let store = MemoryStore::default();
    store.save(&expired_session()).unwrap();
    let client = AuthClient::new(server.url_str(""), ANON_KEY, Box::new(store));

    let session = client.get_session().await.unwrap().unwrap();
    assert_eq!(session.access_token, "renewed");
    assert!(!session.is_expired(chrono::Utc::now()));
}

#[tokio::test]
async fn failed_refresh_discards_session() {
    let server = store_server();
    server.expect(
        Expectation::matching(request::method_path("POST", "/auth/v1/token"))
            .respond_with(status_code(401)),
    );
    let store = MemoryStore::default();
    store.save(&expired_session()).unwrap();
    let client = AuthClient::new(server.url_str(""), ANON_KEY, Box::new(store));

    assert!(client.get_session().await.unwrap().is_none());
    assert!(client.store().load().unwrap().is_none());
}

#[tokio::test]
async fn sign_out_clears_even_when_remote_fails() {
    let server = store_server();
    server.expect(
        Expectation::matching(request::method_path("POST", "/auth/v1/logout"))
            .respond_with(status_code(500)),
    );
    let store = MemoryStore::default();
    store.save(&expired_session()).unwrap();
    let client = AuthClient::new(server.url_str(""), ANON_KEY, Box::new(store));

    client.sign_out().await.unwrap();
    assert!(client.store().load().unwrap().is_none());
}

#[test]
fn file_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join(".folio").join("session.json"));
    assert!(store.load().unwrap().is_none());
    store.save(&expired_session()).unwrap();
    assert_eq!(store.load().unwrap().unwrap().user.id, "user-1");
    store.clear().unwrap();
    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
}

#[test]
#[serial]
fn file_store_selected_from_env() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("HOME", dir.path());
    std::env::set_var(USE_FILE_STORE_ENV, "1");
    let store = default_store();
    store.save(&expired_session()).unwrap();
    assert!(dir.path().join(".folio").join("session.json").exists());
    std::env::remove_var(USE_FILE_STORE_ENV);
}
