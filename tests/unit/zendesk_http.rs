//! Unit tests for ZendeskClient against a mock server

use serde_json::json;
use wiremock::matchers::{basic_auth, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zendesk_export::config::ZendeskConfig;
use zendesk_export::fetcher::zendesk::ZendeskClient;
use zendesk_export::fetcher::{classify_status, StatusClass};
use zendesk_export::Cursor;

fn client_for(server: &MockServer) -> ZendeskClient {
    let config = ZendeskConfig::from_email(
        format!("{}/api/v2", server.uri()),
        "agent@acme.com",
        "secret-token",
    )
    .unwrap();
    ZendeskClient::new(config).unwrap()
}

#[tokio::test]
async fn test_fetch_page_sends_cursor_auth_and_accept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/exports/tickets.json"))
        .and(query_param("start_time", "1700000000"))
        .and(header("accept", "application/json"))
        .and(basic_auth("agent@acme.com/token", "secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "end_time": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .fetch_page(Cursor::new(1700000000))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(classify_status(&response), StatusClass::Success);
    assert!(response.body.contains("results"));
}

#[tokio::test]
async fn test_fetch_page_returns_non_success_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/exports/tickets.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "5"))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .fetch_page(Cursor::new(1700000000))
        .await
        .unwrap();

    assert_eq!(response.status, 429);
    assert_eq!(response.retry_after.as_deref(), Some("5"));
    assert_eq!(
        classify_status(&response),
        StatusClass::RateLimited {
            retry_after: Some(std::time::Duration::from_secs(5))
        }
    );
}

#[tokio::test]
async fn test_fetch_page_too_recent_classification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/exports/tickets.json"))
        .respond_with(ResponseTemplate::new(422).set_body_string("too recent"))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .fetch_page(Cursor::new(1700000000))
        .await
        .unwrap();

    assert_eq!(classify_status(&response), StatusClass::CursorTooRecent);
    assert_eq!(response.body, "too recent");
}

#[tokio::test]
async fn test_fetch_comments_uses_ticket_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/tickets/42/comments.json"))
        .and(basic_auth("agent@acme.com/token", "secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "comments": [{"id": 1, "body": "Hello"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).fetch_comments(42).await.unwrap();

    assert_eq!(response.status, 200);
    assert!(response.body.contains("Hello"));
}

#[tokio::test]
async fn test_network_error_propagates() {
    // Nothing listens on port 1
    let config = ZendeskConfig::from_email("http://127.0.0.1:1/api/v2", "a@acme.com", "t").unwrap();
    let client = ZendeskClient::new(config).unwrap();

    let result = client.fetch_page(Cursor::new(1700000000)).await;
    let error = result.unwrap_err().to_string();
    assert!(error.contains("network"), "unexpected error: {error}");
}
