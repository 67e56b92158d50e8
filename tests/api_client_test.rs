//! HTTP backend integration tests
//!
//! Runs `HttpBackend` against a `wiremock` server and checks what goes on
//! the wire (paths, headers, bodies) and how responses are classified.

use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use querydesk::api::{Backend, HttpBackend, SignupRequest, UploadFile};
use querydesk::config::{ApiConfig, LoginEncoding};
use querydesk::error::QuerydeskError;

mod common;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn backend(server: &MockServer) -> HttpBackend {
    backend_with(server, LoginEncoding::Form)
}

fn backend_with(server: &MockServer, login_encoding: LoginEncoding) -> HttpBackend {
    HttpBackend::new(&ApiConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
        login_encoding,
    })
    .expect("client builds")
}

fn downcast(err: &anyhow::Error) -> &QuerydeskError {
    err.downcast_ref::<QuerydeskError>()
        .expect("error is a QuerydeskError")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_sends_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=alice"))
        .and(body_string_contains("password=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::success(
            json!({"access_token": "a.b.c", "token_type": "bearer"}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = backend(&server).login("alice", "s3cret").await.unwrap();
    let data = envelope.data.unwrap();
    assert_eq!(data.access_token, "a.b.c");
    assert_eq!(data.token_type.as_deref(), Some("bearer"));
}

#[tokio::test]
async fn test_login_multipart_encoding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_string_contains("name=\"username\""))
        .and(body_string_contains("alice"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::success(json!({"access_token": "a.b.c"}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let envelope = backend_with(&server, LoginEncoding::Multipart)
        .login("alice", "pw")
        .await
        .unwrap();
    assert!(envelope.is_success());
}

#[tokio::test]
async fn test_signup_sends_json_body() {
    let server = MockServer::start().await;
    let request = SignupRequest {
        name: "Alice".into(),
        email: "alice@example.com".into(),
        username: "alice".into(),
        password: "pw".into(),
        role: "hr".into(),
    };
    Mock::given(method("POST"))
        .and(path("/api/signup"))
        .and(body_json(json!({
            "name": "Alice",
            "email": "alice@example.com",
            "username": "alice",
            "password": "pw",
            "role": "hr"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::success(json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = backend(&server).signup(&request).await.unwrap();
    assert!(envelope.is_success());
}

#[tokio::test]
async fn test_queries_carry_bearer_and_json_body() {
    let server = MockServer::start().await;
    for (route, data) in [
        ("/api/query", json!({"query": "q", "response": "agent says"})),
        (
            "/api/db/query",
            json!({"query": "q", "sql_query": "SELECT 1", "natural_language_response": "one"}),
        ),
        ("/api/documents/query", json!({"query": "q", "response": "doc says"})),
    ] {
        Mock::given(method("POST"))
            .and(path(route))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({"query": "q"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(common::success(data)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let backend = backend(&server);
    let agent = backend.agent_query("tok", "q").await.unwrap();
    assert_eq!(agent.data.unwrap().response, "agent says");
    let db = backend.db_query("tok", "q").await.unwrap();
    assert_eq!(db.data.unwrap().sql_query.as_deref(), Some("SELECT 1"));
    let doc = backend.doc_query("tok", "q").await.unwrap();
    assert_eq!(doc.data.unwrap().response, "doc says");
}

#[tokio::test]
async fn test_connect_is_authenticated_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/connect"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::success(
            json!({"schema": "CREATE TABLE employees (id INT)"}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = backend(&server).connect("tok").await.unwrap();
    assert_eq!(
        envelope.data.unwrap().schema,
        json!("CREATE TABLE employees (id INT)")
    );
}

#[tokio::test]
async fn test_upload_is_multipart_pdf() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/upload"))
        .and(header("authorization", "Bearer tok"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"handbook.pdf\""))
        .and(body_string_contains("application/pdf"))
        .and(body_string_contains("%PDF-1.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::success(json!({
            "filename": "handbook.pdf",
            "role": "hr",
            "timestamp": "2025-03-01T10:00:00"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = backend(&server)
        .upload_document(
            "tok",
            UploadFile {
                filename: "handbook.pdf".into(),
                bytes: b"%PDF-1.4 test".to_vec(),
            },
        )
        .await
        .unwrap();
    assert_eq!(envelope.data.unwrap().role.as_deref(), Some("hr"));
}

#[tokio::test]
async fn test_base_url_trailing_slash() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::success(json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&ApiConfig {
        base_url: format!("{}/", server.uri()),
        ..ApiConfig::default()
    })
    .unwrap();
    backend.logout("tok").await.unwrap();
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_401_is_unauthorized_with_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/db/query"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"detail": "Invalid or expired credentials. Please log in again."}),
        ))
        .mount(&server)
        .await;

    let err = backend(&server).db_query("stale", "q").await.unwrap_err();
    match downcast(&err) {
        QuerydeskError::Unauthorized(Some(message)) => {
            assert_eq!(message, "Invalid or expired credentials. Please log in again.")
        }
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_envelope_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/query"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::failure("No documents found.")),
        )
        .mount(&server)
        .await;

    let err = backend(&server).doc_query("tok", "q").await.unwrap_err();
    assert_eq!(downcast(&err).server_message(), Some("No documents found."));
}

#[tokio::test]
async fn test_validation_detail_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address"}]
        })))
        .mount(&server)
        .await;

    let request = SignupRequest {
        name: "A".into(),
        email: "nope".into(),
        username: "a".into(),
        password: "p".into(),
        role: "hr".into(),
    };
    let err = backend(&server).signup(&request).await.unwrap_err();
    match downcast(&err) {
        QuerydeskError::Api { status, message } => {
            assert_eq!(*status, 422);
            assert_eq!(
                message.as_deref(),
                Some("value is not a valid email address")
            );
        }
        other => panic!("expected Api, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = backend(&server).agent_query("tok", "q").await.unwrap_err();
    match downcast(&err) {
        QuerydeskError::Api { status, message } => {
            assert_eq!(*status, 502);
            assert!(message.is_none());
        }
        other => panic!("expected Api, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let backend = HttpBackend::new(&ApiConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout_seconds: 2,
        login_encoding: LoginEncoding::Form,
    })
    .unwrap();
    let err = backend.login("a", "b").await.unwrap_err();
    assert!(matches!(downcast(&err), QuerydeskError::Http(_)));
}
