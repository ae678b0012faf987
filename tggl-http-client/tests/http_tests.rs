//! HTTP boundary tests against a mock server.

use std::time::Duration;

use serde_json::json;
use tggl_http_client::{HttpClient, HttpClientConfig, HttpClientError};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, api_key: Option<&str>) -> HttpClient {
    let mut builder = HttpClientConfig::builder().base_url(server.uri());
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    HttpClient::new(builder.build()).unwrap()
}

#[tokio::test]
async fn test_get_sends_api_key_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .and(header("x-tggl-api-key", "server-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("server-key"));
    let flags: Vec<serde_json::Value> = client
        .get("/config")
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap()
        .json()
        .unwrap();

    assert!(flags.is_empty());
}

#[tokio::test]
async fn test_post_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/flags"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!([{"userId": "u1"}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"beta": true}])))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let response = client
        .post("/flags")
        .json(&json!([{"userId": "u1"}]))
        .send()
        .await
        .unwrap();

    assert!(response.is_success());
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body, json!([{"beta": true}]));
}

#[tokio::test]
async fn test_no_api_key_header_when_unset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header_exists("x-tggl-api-key"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let response = client.get("/config").send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_error_field_surfaces() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Some("wrong"));
    let err = client
        .get("/config")
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap_err();

    assert_eq!(err.status_code(), Some(401));
    assert!(err.to_string().contains("Invalid API key"));
}

#[tokio::test]
async fn test_redirects_not_followed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/moved", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let response = client.get("/config").send().await.unwrap();
    assert_eq!(response.status().as_u16(), 302);
    assert!(response.error_for_status().is_err());
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .get("/config")
        .timeout(Duration::from_millis(50))
        .send()
        .await
        .unwrap_err();

    assert!(matches!(err, HttpClientError::Timeout(d) if d == Duration::from_millis(50)));
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_connection_refused() {
    let config = HttpClientConfig::builder()
        .base_url("http://127.0.0.1:9")
        .connect_timeout(Duration::from_millis(200))
        .build();
    let client = HttpClient::new(config).unwrap();

    let err = client.get("/config").send().await.unwrap_err();
    assert!(err.is_connection() || err.is_timeout());
}
