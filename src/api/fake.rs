//! In-process fake backend for action unit tests
//!
//! [`FakeBackend`] answers each endpoint with a scripted [`Outcome`] and
//! records every call (endpoint name plus the bearer token it carried), so
//! tests can assert both on state transitions and on what was sent.
//!
//! Endpoints without a scripted outcome answer 500 with no message.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    AgentData, Backend, ConnectData, DbData, DocData, Envelope, LoginData, SignupRequest,
    UploadData, UploadFile,
};
use crate::error::{QuerydeskError, Result};

/// Scripted answer for one endpoint.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// 200 success envelope with this `data`
    Success(Value),
    /// 200 success envelope with no `data` and an optional message
    Empty(Option<String>),
    /// 200 envelope with `status: "error"` and this message
    ErrorEnvelope(String),
    /// Non-2xx status with an optional message
    Status(u16, Option<String>),
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    outcomes: Mutex<HashMap<&'static str, Outcome>>,
    calls: Mutex<Vec<(&'static str, Option<String>)>>,
    login_password: Mutex<Option<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `endpoint` (sticky: every call gets the same outcome).
    pub fn on(self, endpoint: &'static str, outcome: Outcome) -> Self {
        self.outcomes
            .lock()
            .expect("outcomes lock")
            .insert(endpoint, outcome);
        self
    }

    /// Endpoints called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(endpoint, _)| *endpoint)
            .collect()
    }

    /// Bearer token sent with the most recent call to `endpoint`.
    pub fn token_for(&self, endpoint: &str) -> Option<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .rev()
            .find(|(e, _)| *e == endpoint)
            .and_then(|(_, token)| token.clone())
    }

    /// Password sent with the most recent login.
    pub fn password_for_login(&self) -> Option<String> {
        self.login_password.lock().expect("password lock").clone()
    }

    fn respond<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        token: Option<&str>,
    ) -> Result<Envelope<T>> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((endpoint, token.map(str::to_string)));

        let outcome = self
            .outcomes
            .lock()
            .expect("outcomes lock")
            .get(endpoint)
            .cloned()
            .unwrap_or(Outcome::Status(500, None));

        match outcome {
            Outcome::Success(data) => Ok(Envelope {
                status: "success".to_string(),
                message: Some("ok".to_string()),
                data: Some(serde_json::from_value(data)?),
            }),
            Outcome::Empty(message) => Ok(Envelope {
                status: "success".to_string(),
                message,
                data: None,
            }),
            Outcome::ErrorEnvelope(message) => Err(QuerydeskError::Api {
                status: 200,
                message: Some(message),
            }
            .into()),
            Outcome::Status(401, message) => Err(QuerydeskError::Unauthorized(message).into()),
            Outcome::Status(status, message) => {
                Err(QuerydeskError::Api { status, message }.into())
            }
        }
    }
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn login(&self, _username: &str, password: &str) -> Result<Envelope<LoginData>> {
        *self.login_password.lock().expect("password lock") = Some(password.to_string());
        self.respond("login", None)
    }

    async fn signup(&self, _request: &SignupRequest) -> Result<Envelope<Value>> {
        self.respond("signup", None)
    }

    async fn logout(&self, token: &str) -> Result<Envelope<Value>> {
        self.respond("logout", Some(token))
    }

    async fn connect(&self, token: &str) -> Result<Envelope<ConnectData>> {
        self.respond("connect", Some(token))
    }

    async fn agent_query(&self, token: &str, _query: &str) -> Result<Envelope<AgentData>> {
        self.respond("agent_query", Some(token))
    }

    async fn db_query(&self, token: &str, _query: &str) -> Result<Envelope<DbData>> {
        self.respond("db_query", Some(token))
    }

    async fn doc_query(&self, token: &str, _query: &str) -> Result<Envelope<DocData>> {
        self.respond("doc_query", Some(token))
    }

    async fn upload_document(
        &self,
        token: &str,
        _file: UploadFile,
    ) -> Result<Envelope<UploadData>> {
        self.respond("upload_document", Some(token))
    }
}
