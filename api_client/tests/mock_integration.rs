use api_client::{ApiClient, ApiClientError, FileStorage, ImageFile, PhotoPayload, PhotoStatus, RecordStore};
use httptest::{matchers::*, responders::*, Expectation};
use mocks::{expect_list, records_body, store_server, ANON_KEY};
use serde_json::json;

fn client_for(server: &httptest::Server) -> ApiClient {
    ApiClient::new(server.url_str(""), ANON_KEY)
}

#[tokio::test]
async fn test_list_records_mock() {
    let server = store_server();
    expect_list(&server);
    let client = client_for(&server);

    let records = client.list(None).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "1");
    assert_eq!(records[0].price, Some(150.0));
    assert_eq!(records[1].status, PhotoStatus::Sold);
}

#[tokio::test]
async fn test_list_by_status_sends_filter() {
    let server = store_server();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/rest/v1/photography"),
            request::query(url_decoded(contains(("status", "eq.sold")))),
            request::query(url_decoded(contains(("order", "created_at.desc")))),
        ])
        .respond_with(json_encoded(json!([]))),
    );
    let client = client_for(&server);
    let records = client.list(Some(PhotoStatus::Sold)).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_search_uses_ilike_on_title_and_description() {
    let server = store_server();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/rest/v1/photography"),
            request::query(url_decoded(contains((
                "or",
                "(title.ilike.\"*bosque*\",description.ilike.\"*bosque*\")"
            )))),
        ])
        .respond_with(json_encoded(records_body())),
    );
    let client = client_for(&server);
    let found = client.search("bosque").await.unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn test_search_keeps_dots_and_commas() {
    let server = store_server();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/rest/v1/photography"),
            request::query(url_decoded(contains((
                "or",
                "(title.ilike.\"*St. Louis, f2.8*\",description.ilike.\"*St. Louis, f2.8*\")"
            )))),
        ])
        .respond_with(json_encoded(json!([]))),
    );
    let client = client_for(&server);
    let found = client.search("St. Louis, f2.8").await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_create_sends_bearer_and_returns_record() {
    let server = store_server();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/rest/v1/photography"),
            request::headers(contains(("authorization", "Bearer session-token"))),
            request::headers(contains(("prefer", "return=representation"))),
        ])
        .respond_with(
            status_code(201).body(
                json!([{ "id": "9", "title": "Nuevo", "image_url": "u", "tags": [], "status": "available" }])
                    .to_string(),
            ),
        ),
    );
    let client = client_for(&server).with_access_token("session-token");
    let payload = PhotoPayload {
        title: "Nuevo".into(),
        image_url: "u".into(),
        ..Default::default()
    };
    let created = client.create(&payload).await.unwrap();
    assert_eq!(created.id, "9");
}

#[tokio::test]
async fn test_update_missing_row_is_not_found() {
    let server = store_server();
    server.expect(
        Expectation::matching(request::method_path("PATCH", "/rest/v1/photography"))
            .respond_with(json_encoded(json!([]))),
    );
    let client = client_for(&server);
    let err = client.update("404", &PhotoPayload::default()).await.unwrap_err();
    assert!(matches!(err, ApiClientError::NotFound(id) if id == "404"));
}

#[tokio::test]
async fn test_store_error_message_is_surfaced() {
    let server = store_server();
    server.expect(
        Expectation::matching(request::method_path("GET", "/rest/v1/photography")).respond_with(
            status_code(401).body(json!({ "message": "JWT expired" }).to_string()),
        ),
    );
    let client = client_for(&server);
    let err = client.list(None).await.unwrap_err();
    assert_eq!(err.to_string(), "Store Error (401): JWT expired");
}

#[tokio::test]
async fn test_upload_posts_to_bucket() {
    let server = store_server();
    server.expect(
        Expectation::matching(all_of![
            request::method("POST"),
            request::path(matches("^/storage/v1/object/photography/photo_.*\\.png$")),
            request::headers(contains(("content-type", "image/png"))),
            request::headers(contains(("x-upsert", "false"))),
        ])
        .respond_with(json_encoded(json!({ "Key": "photography/photo.png" }))),
    );
    let client = client_for(&server);
    let file = ImageFile::new("cliff.png", vec![7u8; 4096]);
    let uploaded = client.upload(&file).await.unwrap();
    assert!(uploaded.public_url.contains("/storage/v1/object/public/photography/photo_"));
    assert_eq!(uploaded.size, 4096);
}

#[tokio::test]
async fn test_upload_rejects_invalid_file_without_request() {
    let server = store_server();
    let client = client_for(&server);
    let file = ImageFile::new("notes.txt", vec![1u8; 4096]);
    let err = client.upload(&file).await.unwrap_err();
    assert!(matches!(err, ApiClientError::InvalidFile(_)));
}

#[tokio::test]
async fn test_remove_deletes_by_prefix() {
    let server = store_server();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("DELETE", "/storage/v1/object/photography"),
            request::headers(contains(("authorization", "Bearer session-token"))),
            request::body(json_decoded(eq(json!({ "prefixes": ["photo_1_ab.png"] })))),
        ])
        .respond_with(json_encoded(json!([{ "name": "photo_1_ab.png" }]))),
    );
    let client = client_for(&server).with_access_token("session-token");
    client.remove("photo_1_ab.png").await.unwrap();
}

#[tokio::test]
async fn test_remove_requires_path() {
    let server = store_server();
    let client = client_for(&server);
    assert!(client.remove("").await.is_err());
}
