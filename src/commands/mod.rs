/*!
Command handlers for the CLI

Each one-shot subcommand restores the saved session, runs a single action
and renders the result. A failed action becomes an `Err` carrying the
message the action stored, so the process exits non-zero with that text.

- `shell`            : interactive client
- `special_commands` : `/command` parser used by the shell
- `render`           : terminal output
*/

use std::io::{BufRead, IsTerminal};
use std::path::Path;

use crate::actions::{
    Assistant, AGENT_QUERY_FAILED, CONNECT_FAILED, DB_QUERY_FAILED, DOC_QUERY_FAILED, LOGIN_FAILED,
    SIGNUP_FAILED, UPLOAD_FAILED,
};
use crate::api::{Backend, SignupRequest};
use crate::cli::Commands;
use crate::config::Config;
use crate::error::{QuerydeskError, Result};
use crate::router::{Navigation, Route};

pub mod render;
pub mod shell;
pub mod special_commands;

/// Build the HTTP-backed client and run `command`.
pub async fn run(config: Config, command: Commands) -> Result<()> {
    let mut assistant = Assistant::from_config(&config)?;
    match command {
        Commands::Shell => shell::run_shell(assistant, &config).await,
        command => execute(&mut assistant, command).await,
    }
}

/// Run a one-shot command against any backend.
pub async fn execute<B: Backend>(assistant: &mut Assistant<B>, command: Commands) -> Result<()> {
    let restored = assistant.initialize_auth();
    tracing::debug!(restored, "Session restore finished");

    match command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_secret("Password: ")?,
            };
            login(assistant, &username, &password).await
        }
        Commands::Signup {
            name,
            email,
            username,
            password,
            role,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt_secret("Password: ")?,
            };
            let request = SignupRequest {
                name,
                email,
                username,
                password,
                role,
            };
            signup(assistant, &request).await
        }
        Commands::Logout => {
            assistant.logout().await;
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => {
            if !assistant.state().session.is_authenticated() {
                return Err(QuerydeskError::NotAuthenticated.into());
            }
            render::print_session(&assistant.state().session);
            Ok(())
        }
        Commands::Connect => connect(assistant).await,
        Commands::Agent { query } => {
            enter(assistant, "/")?;
            let query = query.join(" ");
            match assistant.send_agent_query(&query).await {
                Some(record) => {
                    render::print_agent(&record);
                    Ok(())
                }
                None => Err(query_failure(assistant, AGENT_QUERY_FAILED)),
            }
        }
        Commands::Db { query } => {
            enter(assistant, "/db-query")?;
            let query = query.join(" ");
            match assistant.send_db_query(&query).await {
                Some(record) => {
                    render::print_db(&record);
                    Ok(())
                }
                None => Err(query_failure(assistant, DB_QUERY_FAILED)),
            }
        }
        Commands::Doc { query } => {
            enter(assistant, "/doc-query")?;
            let query = query.join(" ");
            match assistant.send_doc_query(&query).await {
                Some(record) => {
                    render::print_doc(&record);
                    Ok(())
                }
                None => Err(query_failure(assistant, DOC_QUERY_FAILED)),
            }
        }
        Commands::Upload { file } => {
            enter(assistant, "/doc-query")?;
            upload(assistant, &file).await
        }
        Commands::Shell => Err(QuerydeskError::Validation(
            "The shell cannot be started from a one-shot command".to_string(),
        )
        .into()),
    }
}

pub(crate) async fn login<B: Backend>(
    assistant: &mut Assistant<B>,
    username: &str,
    password: &str,
) -> Result<()> {
    if assistant.login(username, password).await {
        let role = assistant.state().session.role().unwrap_or("-").to_string();
        println!("Logged in as {} (role: {}).", username, role);
        Ok(())
    } else {
        Err(session_failure(assistant, LOGIN_FAILED))
    }
}

pub(crate) async fn signup<B: Backend>(
    assistant: &mut Assistant<B>,
    request: &SignupRequest,
) -> Result<()> {
    if assistant.signup(request).await {
        println!("Account {} created. You can log in now.", request.username);
        Ok(())
    } else {
        Err(session_failure(assistant, SIGNUP_FAILED))
    }
}

pub(crate) async fn connect<B: Backend>(assistant: &mut Assistant<B>) -> Result<()> {
    if assistant.connect_database().await {
        println!("Connected to database.");
        if let Some(schema) = assistant.state().queries.database_schema() {
            render::print_schema(schema);
        }
        Ok(())
    } else {
        Err(query_failure(assistant, CONNECT_FAILED))
    }
}

pub(crate) async fn upload<B: Backend>(assistant: &mut Assistant<B>, file: &Path) -> Result<()> {
    if assistant.upload_document(file).await {
        println!("Uploaded {}.", file.display());
        Ok(())
    } else {
        Err(query_failure(assistant, UPLOAD_FAILED))
    }
}

/// Guarded navigation for one-shot commands; a redirect to Login means
/// there is no session.
fn enter<B: Backend>(assistant: &mut Assistant<B>, path: &str) -> Result<()> {
    match assistant.navigate(path) {
        Navigation::Redirect(Route::Login) => Err(QuerydeskError::NotAuthenticated.into()),
        _ => Ok(()),
    }
}

fn session_failure<B: Backend>(assistant: &Assistant<B>, fallback: &str) -> anyhow::Error {
    let message = assistant.state().session.error().unwrap_or(fallback);
    anyhow::anyhow!(message.to_string())
}

fn query_failure<B: Backend>(assistant: &Assistant<B>, fallback: &str) -> anyhow::Error {
    let message = assistant.state().queries.error().unwrap_or(fallback);
    anyhow::anyhow!(message.to_string())
}

/// Read a secret with echo off, or one line from stdin when it is piped.
/// The text is kept as typed, surrounding spaces included.
pub(crate) fn prompt_secret(label: &str) -> Result<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        Ok(rpassword::prompt_password(label)?)
    } else {
        read_secret(&mut stdin.lock())
    }
}

/// Read a secret line from `reader`, dropping only the line terminator.
pub(crate) fn read_secret(reader: &mut impl BufRead) -> Result<String> {
    Ok(rpassword::read_password_from_bufread(reader)?)
}
