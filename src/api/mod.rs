//! Backend REST contract
//!
//! Every backend response is wrapped in an [`Envelope`]:
//! `{ "status": "success" | "error", "message": ..., "data": ... }`.
//! Failure bodies produced by the web framework itself (validation errors,
//! 401s) use `{ "detail": ... }` instead; [`ErrorBody`] accepts both shapes.
//!
//! The [`Backend`] trait is the seam between the action layer and the
//! network. [`client::HttpBackend`] is the real implementation; tests can
//! substitute their own.
//!
//! # Canonical Import Path
//!
//! ```no_run
//! use querydesk::api::{Backend, Envelope};
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub mod client;

#[cfg(test)]
pub mod fake;

pub use client::HttpBackend;

/// Standard response wrapper used by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// `"success"` or `"error"`
    pub status: String,
    /// Human-readable outcome message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Endpoint-specific payload
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Returns `true` when `status == "success"`.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Any failure body the backend may send.
///
/// Both fields are optional so that an envelope, a `{detail}` body, or an
/// empty object all deserialize.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<Detail>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Detail {
    Text(String),
    Items(Vec<DetailItem>),
    Other(Value),
}

#[derive(Debug, Clone, Deserialize)]
struct DetailItem {
    #[serde(default)]
    msg: Option<String>,
}

impl ErrorBody {
    /// Extract the single message to show the user.
    ///
    /// Prefers the envelope `message`, then a string `detail`, then the
    /// `msg` fields of a validation `detail` list joined with `"; "`.
    pub fn into_message(self) -> Option<String> {
        if let Some(message) = self.message.filter(|m| !m.trim().is_empty()) {
            return Some(message);
        }
        match self.detail? {
            Detail::Text(text) => Some(text),
            Detail::Items(items) => {
                let joined = items
                    .into_iter()
                    .filter_map(|item| item.msg)
                    .collect::<Vec<_>>()
                    .join("; ");
                (!joined.is_empty()).then_some(joined)
            }
            Detail::Other(_) => None,
        }
    }

    /// Parse a raw response body, returning the extracted message if any.
    pub fn message_from_text(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message)
    }
}

/// `POST /login` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginData {
    /// Signed JWT
    pub access_token: String,
    /// Usually `"bearer"`
    #[serde(default)]
    pub token_type: Option<String>,
}

/// `POST /signup` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: String,
}

/// `GET /connect` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectData {
    /// Opaque schema description; rendered, never interpreted
    pub schema: Value,
}

/// Body for all three query endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// `POST /query` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentData {
    pub query: String,
    pub response: String,
}

/// `POST /db/query` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbData {
    pub query: String,
    /// SQL generated by the backend
    #[serde(default)]
    pub sql_query: Option<String>,
    /// Tabular result as returned by the database layer
    #[serde(default)]
    pub raw_response: Option<Value>,
    pub natural_language_response: String,
}

/// `POST /documents/query` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocData {
    pub query: String,
    pub response: String,
}

/// `POST /documents/upload` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadData {
    pub filename: String,
    #[serde(default)]
    pub role: Option<String>,
    /// Server-side timestamp, kept as sent
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A file to upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The backend operations the client relies on.
///
/// Implementations return `Ok` only for a 2xx response whose envelope has
/// `status == "success"`; everything else becomes a
/// [`crate::error::QuerydeskError`]. A 401 is always
/// [`crate::error::QuerydeskError::Unauthorized`].
#[async_trait::async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// `POST /login`
    async fn login(&self, username: &str, password: &str) -> Result<Envelope<LoginData>>;

    /// `POST /signup`
    async fn signup(&self, request: &SignupRequest) -> Result<Envelope<Value>>;

    /// `POST /logout`
    async fn logout(&self, token: &str) -> Result<Envelope<Value>>;

    /// `GET /connect`
    async fn connect(&self, token: &str) -> Result<Envelope<ConnectData>>;

    /// `POST /query`
    async fn agent_query(&self, token: &str, query: &str) -> Result<Envelope<AgentData>>;

    /// `POST /db/query`
    async fn db_query(&self, token: &str, query: &str) -> Result<Envelope<DbData>>;

    /// `POST /documents/query`
    async fn doc_query(&self, token: &str, query: &str) -> Result<Envelope<DocData>>;

    /// `POST /documents/upload`
    async fn upload_document(&self, token: &str, file: UploadFile)
        -> Result<Envelope<UploadData>>;
}
