//! Command-line interface definition for querydesk
//!
//! This module defines the CLI structure using clap's derive API. One-shot
//! subcommands map onto single actions; `shell` starts the interactive
//! client.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// querydesk - client for the enterprise knowledge assistant
///
/// Log in, ask the agent, query the company database in plain language,
/// and search uploaded documents.
#[derive(Parser, Debug, Clone)]
#[command(name = "querydesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Backend base URL (overrides config and QUERYDESK_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Keep the session in memory only; nothing is written to disk
    #[arg(long)]
    pub ephemeral: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for querydesk
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and save the session
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password; prompted for when omitted
        #[arg(short, long, env = "QUERYDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        /// Display name
        #[arg(long)]
        name: String,

        /// Contact email
        #[arg(long)]
        email: String,

        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password; prompted for when omitted
        #[arg(short, long, env = "QUERYDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Role that scopes document access (e.g. hr, finance)
        #[arg(short, long)]
        role: String,
    },

    /// End the session
    Logout,

    /// Show the current session
    Whoami,

    /// Connect to the database and print its schema
    Connect,

    /// Ask the agent
    Agent {
        /// Question text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Ask the database in natural language
    Db {
        /// Question text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Ask the uploaded documents
    Doc {
        /// Question text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Upload a PDF document
    Upload {
        /// Path to the PDF
        file: PathBuf,
    },

    /// Start the interactive client
    Shell,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
