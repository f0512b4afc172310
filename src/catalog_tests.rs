//! Tests for the catalog client.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::catalog::CatalogClient;
use crate::config::SyncConfig;
use crate::error::SyncError;

fn client_with_mock(mock_uri: &str) -> CatalogClient {
    let config = SyncConfig {
        catalog_list_url: format!("{}/contents/ru/items/misc", mock_uri),
        document_url_template: format!("{}/raw/misc/{{name}}", mock_uri),
        ..SyncConfig::default()
    };
    CatalogClient::new(reqwest::Client::new(), &config)
}

// ── list_entries ─────────────────────────────────────────────────────

#[tokio::test]
async fn list_entries_keeps_listing_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contents/ru/items/misc"))
        .and(header("User-Agent", "lang_price_sync/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "b2.json", "path": "ru/items/misc/b2.json", "type": "file" },
            { "name": "a1.json", "path": "ru/items/misc/a1.json", "type": "file" }
        ])))
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    let entries = client.list_entries().await.unwrap();

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["b2.json", "a1.json"]);
}

#[tokio::test]
async fn list_entries_non_2xx_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contents/ru/items/misc"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    let err = client.list_entries().await.unwrap_err();

    match &err {
        SyncError::HttpStatus { status, .. } => assert_eq!(status.as_u16(), 403),
        other => panic!("Expected HttpStatus, got: {other:?}"),
    }
    assert!(err.is_transport());
}

#[tokio::test]
async fn list_entries_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contents/ru/items/misc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"message\": \"rate limited\"}"))
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    let err = client.list_entries().await.unwrap_err();

    assert!(matches!(err, SyncError::Parse { .. }));
    assert!(!err.is_transport());
}

// ── fetch_document ───────────────────────────────────────────────────

#[tokio::test]
async fn fetch_document_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/raw/misc/x1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "x1",
            "name": { "key": "item.x1" },
            "infoBlocks": []
        })))
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    let doc = client.fetch_document("x1.json").await.unwrap();

    assert_eq!(doc.item_id().unwrap().as_str(), "x1");
    assert_eq!(doc.name_key(), Some("item.x1"));
}

#[tokio::test]
async fn fetch_document_404_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/raw/misc/gone.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    let err = client.fetch_document("gone.json").await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn fetch_document_malformed_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/raw/misc/bad.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ \"id\": "))
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    match client.fetch_document("bad.json").await {
        Err(SyncError::Parse { context, .. }) => assert!(context.contains("bad.json")),
        other => panic!("Expected Parse error, got: {other:?}"),
    }
}

#[test]
fn document_url_encodes_name() {
    let client = client_with_mock("http://localhost");
    assert_eq!(
        client.document_url("a b.json"),
        "http://localhost/raw/misc/a%20b.json"
    );
}
