//! Actions: the only code that talks to the backend and mutates state
//!
//! Every action has the same shape:
//!
//! 1. set `loading`, clear the slice's error
//! 2. issue one backend call
//! 3. on success copy the payload into the store
//! 4. on failure store one human-readable message: the server's text when
//!    it sent one, else the action's fallback
//! 5. clear `loading`
//!
//! A 401 on any authenticated call tears the session down (state and
//! persisted token) and forces the router to Login, whichever action
//! triggered it.

use std::path::Path;

use crate::api::{Backend, Envelope, HttpBackend, SignupRequest, UploadFile};
use crate::auth::jwt::{decode_claims, redact};
use crate::auth::{open_store, PersistedSession, SessionStore};
use crate::config::Config;
use crate::error::{is_unauthorized, user_message, QuerydeskError, Result};
use crate::router::{Navigation, Route, Router};
use crate::store::{AgentRecord, AppState, DbRecord, DocRecord, QueryState};

pub const LOGIN_FAILED: &str = "Login failed.";
pub const SIGNUP_FAILED: &str = "Signup failed.";
pub const LOGOUT_FAILED: &str = "Logout failed.";
pub const CONNECT_FAILED: &str = "Failed to connect to database.";
pub const AGENT_QUERY_FAILED: &str = "Agent query failed.";
pub const DB_QUERY_FAILED: &str = "Database query failed.";
pub const DOC_QUERY_FAILED: &str = "Document query failed.";
pub const UPLOAD_FAILED: &str = "Document upload failed.";

pub const EMPTY_QUERY: &str = "Query cannot be empty.";
pub const PDF_ONLY: &str = "Only PDF files are allowed for upload.";

/// Which query endpoint a question goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Agent,
    Database,
    Documents,
}

impl QueryKind {
    /// Query kind served by a route, if any.
    pub fn for_route(route: Route) -> Option<Self> {
        match route {
            Route::Home => Some(Self::Agent),
            Route::DbQuery => Some(Self::Database),
            Route::DocQuery => Some(Self::Documents),
            Route::Login | Route::Signup => None,
        }
    }
}

/// Record appended by a successful query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Agent(AgentRecord),
    Database(DbRecord),
    Documents(DocRecord),
}

/// Client controller: backend + state + router + token persistence.
#[derive(Debug)]
pub struct Assistant<B: Backend> {
    backend: B,
    state: AppState,
    router: Router,
    store: Box<dyn SessionStore>,
}

impl Assistant<HttpBackend> {
    /// Wire up the HTTP backend and the configured session store.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = HttpBackend::new(&config.api)?;
        let store = open_store(&config.session, &config.api.base_url)?;
        Ok(Self::new(backend, store))
    }
}

impl<B: Backend> Assistant<B> {
    pub fn new(backend: B, store: Box<dyn SessionStore>) -> Self {
        Self {
            backend,
            state: AppState::default(),
            router: Router::default(),
            store,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn current_route(&self) -> Route {
        self.router.current()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Guarded navigation by path.
    pub fn navigate(&mut self, path: &str) -> Navigation {
        let authenticated = self.state.session.is_authenticated();
        self.router.push_path(path, authenticated)
    }

    // -----------------------------------------------------------------------
    // Session actions
    // -----------------------------------------------------------------------

    /// Restore the session saved by an earlier run.
    ///
    /// A token that fails to decode or whose `exp` has passed is discarded,
    /// both from memory and from storage. Expiry is checked here only.
    ///
    /// Returns whether a session is active afterwards.
    pub fn initialize_auth(&mut self) -> bool {
        let persisted = match self.store.load() {
            Ok(Some(persisted)) => persisted,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!("Could not read saved session, discarding it: {:#}", e);
                self.clear_session();
                return false;
            }
        };

        let claims = match decode_claims(&persisted.access_token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("Saved token is malformed, discarding it: {:#}", e);
                self.clear_session();
                return false;
            }
        };

        if claims.is_expired() {
            tracing::info!("Saved token expired at {:?}, discarding it", claims.expires_at());
            self.clear_session();
            return false;
        }

        let role = claims.role().map(str::to_string).or(persisted.role);
        self.state.session.set_token(persisted.access_token);
        self.state.session.set_user(claims);
        self.state.session.set_role(role);
        tracing::debug!("Session restored from storage");
        true
    }

    /// Exchange credentials for a token.
    ///
    /// On success the token is persisted, its claims become the current
    /// user, and the router moves to Home. A success envelope without a
    /// decodable token counts as failure and leaves nothing persisted.
    pub async fn login(&mut self, username: &str, password: &str) -> bool {
        self.state.session.set_loading(true);
        self.state.session.set_error(None);

        let result = self.backend.login(username, password).await;
        let outcome = match result {
            Ok(envelope) => self.accept_login(envelope),
            Err(e) => Err(e),
        };

        self.state.session.set_loading(false);
        match outcome {
            Ok(()) => {
                tracing::info!(username, role = ?self.state.session.role(), "Logged in");
                let authenticated = self.state.session.is_authenticated();
                self.router.push(Some(Route::Home), authenticated);
                true
            }
            Err(e) => {
                tracing::warn!(username, "Login failed: {:#}", e);
                self.state
                    .session
                    .set_error(Some(user_message(&e, LOGIN_FAILED)));
                false
            }
        }
    }

    fn accept_login(&mut self, envelope: Envelope<crate::api::LoginData>) -> Result<()> {
        let token = match envelope.data.map(|data| data.access_token) {
            Some(token) if !token.trim().is_empty() => token,
            _ => {
                return Err(QuerydeskError::Api {
                    status: 200,
                    message: envelope.message,
                }
                .into())
            }
        };

        let claims = decode_claims(&token)?;
        let role = claims.role().map(str::to_string);

        let persisted = PersistedSession {
            access_token: token.clone(),
            role: role.clone(),
        };
        if let Err(e) = self.store.save(&persisted) {
            tracing::warn!("Could not persist session, it will end with this process: {:#}", e);
        }

        tracing::debug!(token = %redact(&token), "Accepted access token");
        self.state.session.set_token(token);
        self.state.session.set_user(claims);
        self.state.session.set_role(role);
        Ok(())
    }

    /// Create an account. On success the router moves to Login.
    pub async fn signup(&mut self, request: &SignupRequest) -> bool {
        self.state.session.set_loading(true);
        self.state.session.set_error(None);

        let result = self.backend.signup(request).await;

        self.state.session.set_loading(false);
        match result {
            Ok(envelope) => {
                tracing::info!(
                    username = %request.username,
                    message = ?envelope.message,
                    "Account created"
                );
                let authenticated = self.state.session.is_authenticated();
                self.router.push(Some(Route::Login), authenticated);
                true
            }
            Err(e) => {
                tracing::warn!(username = %request.username, "Signup failed: {:#}", e);
                self.state
                    .session
                    .set_error(Some(user_message(&e, SIGNUP_FAILED)));
                false
            }
        }
    }

    /// End the session.
    ///
    /// The server call is best effort: local state is cleared and the router
    /// moves to Login whatever the backend answers.
    pub async fn logout(&mut self) {
        self.state.session.set_loading(true);

        if let Some(token) = self.state.session.token().map(str::to_string) {
            if let Err(e) = self.backend.logout(&token).await {
                tracing::warn!(
                    "{} Clearing local session anyway: {}",
                    LOGOUT_FAILED,
                    user_message(&e, LOGOUT_FAILED)
                );
            }
        }

        self.clear_session();
        self.router.force(Route::Login);
        self.state.session.set_loading(false);
        tracing::info!("Logged out");
    }

    // -----------------------------------------------------------------------
    // Query actions
    // -----------------------------------------------------------------------

    /// Fetch the database schema and mark the database connected.
    pub async fn connect_database(&mut self) -> bool {
        let Some(token) = self.begin_authenticated() else {
            self.state.queries.set_db_connection(false);
            return false;
        };

        let result = self.backend.connect(&token).await;
        match self.finish(result, CONNECT_FAILED) {
            Some(data) if !data.schema.is_null() => {
                tracing::info!("Database connected");
                self.state.queries.set_db_schema(data.schema);
                true
            }
            Some(_) => {
                tracing::warn!("{} Response carried no schema", CONNECT_FAILED);
                self.fail_query(CONNECT_FAILED.to_string());
                self.state.queries.set_db_connection(false);
                false
            }
            None => {
                self.state.queries.set_db_connection(false);
                false
            }
        }
    }

    /// Ask the agent. Appends one record on success.
    pub async fn send_agent_query(&mut self, query: &str) -> Option<AgentRecord> {
        let token = self.begin_query(query)?;
        let result = self.backend.agent_query(&token, query).await;
        let record = AgentRecord::from(self.finish(result, AGENT_QUERY_FAILED)?);
        self.state.queries.add_agent_record(record.clone());
        Some(record)
    }

    /// Ask the database. Appends one record on success.
    pub async fn send_db_query(&mut self, query: &str) -> Option<DbRecord> {
        let token = self.begin_query(query)?;
        let result = self.backend.db_query(&token, query).await;
        let record = DbRecord::from(self.finish(result, DB_QUERY_FAILED)?);
        self.state.queries.add_db_record(record.clone());
        Some(record)
    }

    /// Ask the documents. Appends one record on success.
    pub async fn send_doc_query(&mut self, query: &str) -> Option<DocRecord> {
        let token = self.begin_query(query)?;
        let result = self.backend.doc_query(&token, query).await;
        let record = DocRecord::from(self.finish(result, DOC_QUERY_FAILED)?);
        self.state.queries.add_doc_record(record.clone());
        Some(record)
    }

    /// Dispatch to the query action for `kind`.
    pub async fn send_query(&mut self, kind: QueryKind, query: &str) -> Option<QueryOutcome> {
        match kind {
            QueryKind::Agent => self.send_agent_query(query).await.map(QueryOutcome::Agent),
            QueryKind::Database => self.send_db_query(query).await.map(QueryOutcome::Database),
            QueryKind::Documents => self
                .send_doc_query(query)
                .await
                .map(QueryOutcome::Documents),
        }
    }

    /// Upload a PDF from disk. The filename joins the uploaded set once.
    pub async fn upload_document(&mut self, path: &Path) -> bool {
        let Some(token) = self.begin_authenticated() else {
            return false;
        };

        let filename = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.to_string(),
            None => {
                self.state.queries.set_loading(false);
                self.fail_query(format!("Not a file: {}", path.display()));
                return false;
            }
        };
        if !filename.to_lowercase().ends_with(".pdf") {
            self.state.queries.set_loading(false);
            self.fail_query(PDF_ONLY.to_string());
            return false;
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.state.queries.set_loading(false);
                self.fail_query(format!("Could not read {}: {}", path.display(), e));
                return false;
            }
        };

        let result = self
            .backend
            .upload_document(&token, UploadFile { filename, bytes })
            .await;
        match self.finish(result, UPLOAD_FAILED) {
            Some(data) => {
                let filename = data.filename.clone();
                if self.state.queries.add_uploaded_doc(data.into()) {
                    tracing::info!(filename = %filename, "Document uploaded");
                } else {
                    tracing::info!(filename = %filename, "Document re-uploaded");
                }
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Validate query text, then [`Self::begin_authenticated`].
    fn begin_query(&mut self, query: &str) -> Option<String> {
        if query.trim().is_empty() {
            self.fail_query(EMPTY_QUERY.to_string());
            return None;
        }
        self.begin_authenticated()
    }

    /// Start a query-slice action that needs a token.
    ///
    /// Without a token nothing is sent: the error is set and the guard's
    /// answer (Login) becomes the current route.
    fn begin_authenticated(&mut self) -> Option<String> {
        let Some(token) = self.state.session.token().map(str::to_string) else {
            self.fail_query(QuerydeskError::NotAuthenticated.to_string());
            self.router.force(Route::Login);
            return None;
        };
        self.state.queries.set_loading(true);
        self.state.queries.clear_error();
        Some(token)
    }

    /// Close a query-slice action, returning the payload on success.
    fn finish<T>(&mut self, result: Result<Envelope<T>>, fallback: &str) -> Option<T> {
        self.state.queries.set_loading(false);
        match result {
            Ok(envelope) => match envelope.data {
                Some(data) => Some(data),
                None => {
                    let message = envelope.message.unwrap_or_else(|| fallback.to_string());
                    tracing::warn!("{} Success envelope carried no data", fallback);
                    self.fail_query(message);
                    None
                }
            },
            Err(e) => {
                if is_unauthorized(&e) {
                    self.force_logout();
                }
                tracing::warn!("{} {:#}", fallback, e);
                self.fail_query(user_message(&e, fallback));
                None
            }
        }
    }

    fn fail_query(&mut self, message: String) {
        self.state.queries.set_error(Some(message));
    }

    /// 401 recovery: drop the session and go to Login.
    fn force_logout(&mut self) {
        tracing::warn!("Session rejected by backend, logging out");
        self.clear_session();
        self.router.force(Route::Login);
    }

    /// Clear in-memory session, persisted token, and the session's query
    /// history.
    fn clear_session(&mut self) {
        self.state.session.clear_auth();
        self.state.queries = QueryState::default();
        if let Err(e) = self.store.clear() {
            tracing::warn!("Could not remove saved session: {:#}", e);
        }
    }
}
