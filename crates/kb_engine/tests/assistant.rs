use std::collections::BTreeMap;

use kb_engine::{
    AssistantFailureKind, AssistantSettings, KnowledgeBase, PineconeAssistant, StoredDocument,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer, api_key: Option<&str>) -> AssistantSettings {
    AssistantSettings {
        base_url: server.uri(),
        assistant_name: "portable-spas".to_string(),
        api_key: api_key.map(str::to_string),
        ..AssistantSettings::default()
    }
}

fn catalog_metadata() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("source".to_string(), "shopify_atom_feed".to_string()),
        ("type".to_string(), "product_catalog".to_string()),
        ("upload_date".to_string(), "2025-10-01".to_string()),
    ])
}

#[tokio::test]
async fn upload_sends_key_metadata_and_file_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/assistant/files/portable-spas"))
        .and(header("Api-Key", "test-key"))
        .and(query_param(
            "metadata",
            r#"{"source":"shopify_atom_feed","type":"product_catalog","upload_date":"2025-10-01"}"#,
        ))
        .and(body_string_contains(
            r#"name="file"; filename="product-catalog-2025-10-01.md""#,
        ))
        .and(body_string_contains("# Portable Spas Product Catalog"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "file-123", "status": "Processing"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let assistant = PineconeAssistant::new(settings(&server, Some("test-key"))).unwrap();
    let result = assistant
        .upload(
            "product-catalog-2025-10-01.md",
            b"# Portable Spas Product Catalog\n\n".to_vec(),
            &catalog_metadata(),
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.id, "file-123");
    assert_eq!(result.status, "Processing");
}

#[tokio::test]
async fn upload_response_without_fields_uses_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/assistant/files/portable-spas"))
        .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
        .mount(&server)
        .await;

    let assistant = PineconeAssistant::new(settings(&server, Some("k"))).unwrap();
    let result = assistant
        .upload("documentation-2025-10-01.txt", b"x".to_vec(), &BTreeMap::new())
        .await
        .unwrap();

    assert_eq!(result.id, "N/A");
    assert_eq!(result.status, "Uploaded");
}

#[tokio::test]
async fn upload_rejection_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/assistant/files/portable-spas"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let assistant = PineconeAssistant::new(settings(&server, Some("wrong"))).unwrap();
    let err = assistant
        .upload("documentation-2025-10-01.txt", b"x".to_vec(), &BTreeMap::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, AssistantFailureKind::HttpStatus(401));
    assert_eq!(err.message, "invalid api key");
}

#[tokio::test]
async fn missing_api_key_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let assistant = PineconeAssistant::new(settings(&server, None)).unwrap();
    let err = assistant.list_documents().await.unwrap_err();
    assert_eq!(err.kind, AssistantFailureKind::MissingCredentials);
}

#[tokio::test]
async fn list_parses_files_and_defaults_missing_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assistant/files/portable-spas"))
        .and(header("Api-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"name": "product-catalog-2025-10-01.md", "status": "Available", "size": 2048, "id": "a"},
                {"id": "b"}
            ]
        })))
        .mount(&server)
        .await;

    let assistant = PineconeAssistant::new(settings(&server, Some("test-key"))).unwrap();
    let documents = assistant.list_documents().await.unwrap();

    assert_eq!(
        documents,
        vec![
            StoredDocument {
                name: "product-catalog-2025-10-01.md".to_string(),
                status: "Available".to_string(),
                size_bytes: 2048,
            },
            StoredDocument {
                name: "Unknown".to_string(),
                status: "Unknown".to_string(),
                size_bytes: 0,
            },
        ]
    );
}

#[tokio::test]
async fn list_with_unparsable_body_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assistant/files/portable-spas"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let assistant = PineconeAssistant::new(settings(&server, Some("k"))).unwrap();
    let err = assistant.list_documents().await.unwrap_err();
    assert_eq!(err.kind, AssistantFailureKind::InvalidResponse);
}
