//! Client state container
//!
//! Two slices mirror the two concerns of the UI: [`SessionState`] for who
//! is logged in and [`QueryState`] for everything fetched since. Actions
//! write to disjoint fields, so the container needs no internal locking;
//! it is owned by [`crate::actions::Assistant`] and mutated through
//! `&mut`.

pub mod queries;
pub mod session;

pub use queries::{AgentRecord, DbRecord, DocRecord, QueryState, UploadedDocument};
pub use session::SessionState;

/// Whole-client state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub session: SessionState,
    pub queries: QueryState,
}

impl AppState {
    /// `true` while either slice has an action in flight.
    pub fn is_loading(&self) -> bool {
        self.session.is_loading() || self.queries.is_loading()
    }
}
