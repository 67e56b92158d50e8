//! Session credentials
//!
//! # Module Layout
//!
//! - [`jwt`]           -- unverified decoding of the bearer token's claims
//! - [`session_store`] -- persistence of the bearer token between runs

pub mod jwt;
pub mod session_store;

pub use jwt::{decode_claims, TokenClaims};
pub use session_store::{
    open_store, FileSessionStore, KeyringSessionStore, MemorySessionStore, PersistedSession,
    SessionStore,
};
