use capes_core::{CapeApiClient, CapeApiError, CapeCategory, RemoteEntry};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

#[tokio::test]
async fn fetch_directory_parses_descriptors_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"patek_cz":{"id":"custom_0","custom":true},"alice":{"id":"premium_2"},"bob":{"id":"free_1","custom":false}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let client = CapeApiClient::with_base_url(&api_base(&server)).unwrap();
    let directory = client.fetch_directory().await.unwrap();

    assert_eq!(directory.len(), 3);
    let categories: Vec<(&str, CapeCategory)> = directory
        .iter()
        .map(|(user, entry)| match entry {
            RemoteEntry::Descriptor(d) => (user, d.category()),
            RemoteEntry::Malformed(err) => panic!("unexpected malformed entry: {err}"),
        })
        .collect();
    assert_eq!(
        categories,
        vec![
            ("patek_cz", CapeCategory::Custom),
            ("alice", CapeCategory::Premium),
            ("bob", CapeCategory::Free),
        ]
    );
}

#[tokio::test]
async fn fetch_directory_reports_status_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = CapeApiClient::with_base_url(&api_base(&server)).unwrap();
    let err = client.fetch_directory().await.unwrap_err();

    match err {
        CapeApiError::Api { status, body } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn fetch_directory_rejects_non_object_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["alice", "bob"])))
        .mount(&server)
        .await;

    let client = CapeApiClient::with_base_url(&api_base(&server)).unwrap();
    let err = client.fetch_directory().await.unwrap_err();

    assert!(matches!(err, CapeApiError::Request(_)));
}

#[tokio::test]
async fn fetch_directory_accepts_empty_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = CapeApiClient::with_base_url(&api_base(&server)).unwrap();
    assert!(client.fetch_directory().await.unwrap().is_empty());
}

#[tokio::test]
async fn download_cape_returns_raw_bytes() {
    let server = MockServer::start().await;
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    Mock::given(method("GET"))
        .and(path("/api/cape/custom_0"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png.clone()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = CapeApiClient::with_base_url(&api_base(&server)).unwrap();
    let bytes = client.download_cape("custom_0").await.unwrap();

    assert_eq!(bytes, png);
}

#[tokio::test]
async fn download_cape_reports_missing_texture() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cape/free_404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = CapeApiClient::with_base_url(&api_base(&server)).unwrap();
    let err = client.download_cape("free_404").await.unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}
