//! Authentication slice of the state container

use crate::auth::TokenClaims;

/// Who is logged in, as far as the client knows.
///
/// "Authenticated" means a token is held. Whether the backend still accepts
/// it is only discovered on the next request.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    token: Option<String>,
    user: Option<TokenClaims>,
    role: Option<String>,
    loading: bool,
    error: Option<String>,
}

impl SessionState {
    // Getters

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Decoded (unverified) claims of the current token.
    pub fn current_user(&self) -> Option<&TokenClaims> {
        self.user.as_ref()
    }

    /// Role from the claims, or the cached role when claims lack one.
    pub fn role(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(TokenClaims::role)
            .or(self.role.as_deref())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    // Mutations

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn set_user(&mut self, user: TokenClaims) {
        self.user = Some(user);
    }

    pub fn set_role(&mut self, role: Option<String>) {
        self.role = role;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Drop token, claims and cached role.
    pub fn clear_auth(&mut self) {
        self.token = None;
        self.user = None;
        self.role = None;
    }
}
