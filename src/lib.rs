//! querydesk - client library for the enterprise knowledge assistant
//!
//! The assistant backend answers three kinds of questions: free-form agent
//! questions, natural-language database queries, and questions over
//! uploaded documents. This library is the client side: a typed REST
//! client, session handling around a bearer token, a two-slice state
//! container, and a route guard that mirrors which views need a session.
//!
//! # Architecture
//!
//! - `api`: wire types and the [`api::Backend`] trait, with the reqwest implementation
//! - `auth`: token claim decoding and persistent session storage
//! - `store`: session and query state
//! - `router`: routes, route metadata, and the navigation guard
//! - `actions`: the [`actions::Assistant`] controller that ties them together
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`, `commands`: the `querydesk` binary
//!
//! # Example
//!
//! ```no_run
//! use querydesk::{Assistant, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let mut assistant = Assistant::from_config(&config)?;
//!     if !assistant.initialize_auth() {
//!         assistant.login("alice", "secret").await;
//!     }
//!     if let Some(record) = assistant.send_db_query("How many employees are in HR?").await {
//!         println!("{}", record.natural_language_response);
//!     }
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod router;
pub mod store;

// Re-export commonly used types
pub use actions::{Assistant, QueryKind, QueryOutcome};
pub use api::{Backend, HttpBackend};
pub use config::Config;
pub use error::{QuerydeskError, Result};
pub use router::{Navigation, Route, Router};
pub use store::AppState;
