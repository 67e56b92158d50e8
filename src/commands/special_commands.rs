//! Special commands parser for the interactive shell
//!
//! Shell input starting with `/` is a command rather than a question:
//! navigation, session control, uploads, and listings. Command names are
//! case-insensitive; arguments (paths) keep their case.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command takes no argument but was given one
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Commands handled by the shell itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Navigate to a path through the route guard
    Go(String),

    /// Prompt for credentials and log in
    Login,

    /// Prompt for account details and sign up
    Signup,

    /// End the session
    Logout,

    /// Connect to the database and show its schema
    Connect,

    /// Upload a PDF
    Upload(PathBuf),

    /// Show the responses of the current view
    History,

    /// List documents uploaded this session
    Docs,

    /// Show the database schema fetched by `/connect`
    Schema,

    /// Show the current session
    Whoami,

    /// Display help information
    Help,

    /// Exit the shell
    Exit,

    /// Not a special command; the input is a question for the current view
    None,
}

/// Parse one line of shell input.
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for an unrecognised `/command`,
/// `MissingArgument` when `/go` or `/upload` lacks its argument, and
/// `UnsupportedArgument` when an argument-free command is given one.
///
/// # Examples
///
/// ```
/// use querydesk::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/db").unwrap(), SpecialCommand::Go("/db-query".into()));
/// assert_eq!(parse_special_command("how many staff?").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/frobnicate").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    let with_arg = |usage: &str, build: fn(&str) -> SpecialCommand| {
        if arg.is_empty() {
            Err(CommandError::MissingArgument {
                command: name.clone(),
                usage: usage.to_string(),
            })
        } else {
            Ok(build(arg))
        }
    };

    let command = match name.as_str() {
        "/go" => return with_arg("/go <path>", |a| SpecialCommand::Go(a.to_string())),
        "/upload" => return with_arg("/upload <file.pdf>", |a| SpecialCommand::Upload(a.into())),

        "/home" | "/agent" => SpecialCommand::Go("/".to_string()),
        "/db" => SpecialCommand::Go("/db-query".to_string()),
        "/doc" => SpecialCommand::Go("/doc-query".to_string()),

        "/login" => SpecialCommand::Login,
        "/signup" => SpecialCommand::Signup,
        "/logout" => SpecialCommand::Logout,
        "/connect" => SpecialCommand::Connect,
        "/history" => SpecialCommand::History,
        "/docs" => SpecialCommand::Docs,
        "/schema" => SpecialCommand::Schema,
        "/whoami" => SpecialCommand::Whoami,
        "/help" | "/?" => SpecialCommand::Help,
        "/exit" | "/quit" => SpecialCommand::Exit,

        _ => return Err(CommandError::UnknownCommand(name)),
    };

    if !arg.is_empty() {
        return Err(CommandError::UnsupportedArgument {
            command: name,
            arg: arg.to_string(),
        });
    }
    Ok(command)
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Shell Commands
==============

NAVIGATION:
  /go <path>      - Open a view: /, /db-query, /doc-query, /login, /signup
  /home, /agent   - Shorthand for /go /
  /db             - Shorthand for /go /db-query
  /doc            - Shorthand for /go /doc-query

SESSION:
  /login          - Log in
  /signup         - Create an account
  /logout         - End the session
  /whoami         - Show the current user and role

DATA:
  /connect        - Connect to the database and show its schema
  /schema         - Show the schema fetched by /connect
  /upload <file>  - Upload a PDF document
  /docs           - List documents uploaded this session
  /history        - Show responses in the current view

CONTROL:
  /help, /?       - Show this help message
  /exit, exit     - Leave the shell

NOTES:
  - Command names are case-insensitive
  - Other input is a question for the current view: the agent on /,
    the database on /db-query, the documents on /doc-query
"#
    );
}
