//! HTTP implementation of [`Backend`]
//!
//! Every endpoint lives under `{base_url}/api`. Authenticated calls attach
//! `Authorization: Bearer <token>`. Responses are classified in one place,
//! [`HttpBackend::unwrap_envelope`]:
//!
//! - `401 Unauthorized` -> [`QuerydeskError::Unauthorized`]
//! - any other non-2xx -> [`QuerydeskError::Api`] with the body's message
//! - 2xx whose envelope status is not `"success"` -> [`QuerydeskError::Api`]
//! - 2xx success -> the decoded [`Envelope`]

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    AgentData, Backend, ConnectData, DbData, DocData, Envelope, ErrorBody, LoginData,
    QueryRequest, SignupRequest, UploadData, UploadFile,
};
use crate::config::{ApiConfig, LoginEncoding};
use crate::error::{QuerydeskError, Result};

/// reqwest-backed client for the assistant backend.
///
/// # Examples
///
/// ```no_run
/// use querydesk::api::HttpBackend;
/// use querydesk::config::ApiConfig;
///
/// let backend = HttpBackend::new(&ApiConfig::default()).unwrap();
/// assert!(backend.endpoint("query").ends_with("/api/query"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    /// Underlying reqwest HTTP client.
    http_client: reqwest::Client,
    /// `{base_url}/api` without a trailing slash.
    api_root: String,
    /// Body encoding for the login form.
    login_encoding: LoginEncoding,
}

impl HttpBackend {
    /// Construct a backend client from configuration.
    ///
    /// No network I/O is performed at construction time.
    ///
    /// # Errors
    ///
    /// Returns [`QuerydeskError::Http`] if the reqwest client cannot be
    /// built (TLS initialisation failure).
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(QuerydeskError::Http)?;

        Ok(Self {
            http_client,
            api_root: format!("{}/api", config.base_url.trim_end_matches('/')),
            login_encoding: config.login_encoding,
        })
    }

    /// Full URL for an endpoint path relative to `/api`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    fn authorized(&self, req: RequestBuilder, token: &str) -> RequestBuilder {
        req.header("Authorization", format!("Bearer {}", token))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Envelope<T>> {
        let response = req.send().await.map_err(QuerydeskError::Http)?;
        let status = response.status();
        let body = response.text().await.map_err(QuerydeskError::Http)?;
        Self::unwrap_envelope(status, &body)
    }

    /// Classify a response by status and body.
    fn unwrap_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<Envelope<T>> {
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Backend answered 401 Unauthorized");
            return Err(QuerydeskError::Unauthorized(ErrorBody::message_from_text(body)).into());
        }

        if !status.is_success() {
            let message = ErrorBody::message_from_text(body);
            tracing::debug!(status = status.as_u16(), ?message, "Backend request failed");
            return Err(QuerydeskError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        // Peek at the status field first so that an error envelope with a
        // payload of the wrong shape still yields its message.
        let head: Envelope<Value> =
            serde_json::from_str(body).map_err(QuerydeskError::Serialization)?;
        if !head.is_success() {
            return Err(QuerydeskError::Api {
                status: status.as_u16(),
                message: head.message,
            }
            .into());
        }

        let envelope: Envelope<T> =
            serde_json::from_str(body).map_err(QuerydeskError::Serialization)?;
        Ok(envelope)
    }

    async fn post_query<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        query: &str,
    ) -> Result<Envelope<T>> {
        tracing::debug!(endpoint = path, "Sending query");
        let req = self
            .http_client
            .post(self.endpoint(path))
            .json(&QueryRequest {
                query: query.to_string(),
            });
        self.send(self.authorized(req, token)).await
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn login(&self, username: &str, password: &str) -> Result<Envelope<LoginData>> {
        tracing::debug!(username, encoding = ?self.login_encoding, "Sending login");
        let req = self.http_client.post(self.endpoint("login"));
        let req = match self.login_encoding {
            LoginEncoding::Form => req.form(&[("username", username), ("password", password)]),
            LoginEncoding::Multipart => req.multipart(
                Form::new()
                    .text("username", username.to_string())
                    .text("password", password.to_string()),
            ),
        };
        self.send(req).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<Envelope<Value>> {
        tracing::debug!(username = %request.username, role = %request.role, "Sending signup");
        let req = self.http_client.post(self.endpoint("signup")).json(request);
        self.send(req).await
    }

    async fn logout(&self, token: &str) -> Result<Envelope<Value>> {
        let req = self.http_client.post(self.endpoint("logout"));
        self.send(self.authorized(req, token)).await
    }

    async fn connect(&self, token: &str) -> Result<Envelope<ConnectData>> {
        let req = self.http_client.get(self.endpoint("connect"));
        self.send(self.authorized(req, token)).await
    }

    async fn agent_query(&self, token: &str, query: &str) -> Result<Envelope<AgentData>> {
        self.post_query("query", token, query).await
    }

    async fn db_query(&self, token: &str, query: &str) -> Result<Envelope<DbData>> {
        self.post_query("db/query", token, query).await
    }

    async fn doc_query(&self, token: &str, query: &str) -> Result<Envelope<DocData>> {
        self.post_query("documents/query", token, query).await
    }

    async fn upload_document(
        &self,
        token: &str,
        file: UploadFile,
    ) -> Result<Envelope<UploadData>> {
        tracing::debug!(filename = %file.filename, bytes = file.bytes.len(), "Uploading document");
        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str("application/pdf")
            .map_err(QuerydeskError::Http)?;
        let req = self
            .http_client
            .post(self.endpoint("documents/upload"))
            .multipart(Form::new().part("file", part));
        self.send(self.authorized(req, token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> HttpBackend {
        HttpBackend::new(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
        .expect("client builds")
    }

    #[test]
    fn test_endpoint_joins_api_root() {
        let b = backend("http://localhost:8000");
        assert_eq!(b.endpoint("login"), "http://localhost:8000/api/login");
        assert_eq!(b.endpoint("/db/query"), "http://localhost:8000/api/db/query");
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let b = backend("http://localhost:8000/");
        assert_eq!(b.endpoint("connect"), "http://localhost:8000/api/connect");
    }

    #[test]
    fn test_unwrap_envelope_success() {
        let env: Envelope<AgentData> = HttpBackend::unwrap_envelope(
            StatusCode::OK,
            r#"{"status":"success","data":{"query":"q","response":"a"}}"#,
        )
        .unwrap();
        assert_eq!(env.data.unwrap().response, "a");
    }

    #[test]
    fn test_unwrap_envelope_401_is_unauthorized() {
        let err = HttpBackend::unwrap_envelope::<Value>(
            StatusCode::UNAUTHORIZED,
            r#"{"detail":"Invalid or expired credentials. Please log in again."}"#,
        )
        .unwrap_err();
        match err.downcast_ref::<QuerydeskError>() {
            Some(QuerydeskError::Unauthorized(Some(msg))) => {
                assert!(msg.contains("expired credentials"))
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_unwrap_envelope_error_status_in_200() {
        let err = HttpBackend::unwrap_envelope::<AgentData>(
            StatusCode::OK,
            r#"{"status":"error","message":"Query failed upstream","data":{}}"#,
        )
        .unwrap_err();
        match err.downcast_ref::<QuerydeskError>() {
            Some(QuerydeskError::Api { status, message }) => {
                assert_eq!(*status, 200);
                assert_eq!(message.as_deref(), Some("Query failed upstream"));
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[test]
    fn test_unwrap_envelope_500_without_body() {
        let err =
            HttpBackend::unwrap_envelope::<Value>(StatusCode::INTERNAL_SERVER_ERROR, "").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QuerydeskError>(),
            Some(QuerydeskError::Api {
                status: 500,
                message: None
            })
        ));
    }

    #[test]
    fn test_unwrap_envelope_malformed_success_body() {
        let err = HttpBackend::unwrap_envelope::<Value>(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QuerydeskError>(),
            Some(QuerydeskError::Serialization(_))
        ));
    }
}
