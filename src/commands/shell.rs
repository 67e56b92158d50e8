//! Interactive shell.
//!
//! A readline loop over one [`Assistant`]. The prompt shows the current
//! route; `/commands` drive navigation and session control, and any other
//! input is a question for the view the router is on.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::special_commands::{parse_special_command, print_help, SpecialCommand};
use super::{connect, login, prompt_secret, render, signup, upload};
use crate::actions::{Assistant, QueryKind, QueryOutcome};
use crate::api::{Backend, SignupRequest};
use crate::config::Config;
use crate::error::Result;
use crate::router::{Navigation, Route};

/// Run the shell until `/exit`, Ctrl-C or Ctrl-D.
pub async fn run_shell<B: Backend>(mut assistant: Assistant<B>, config: &Config) -> Result<()> {
    tracing::info!("Starting interactive shell");

    if assistant.initialize_auth() {
        assistant.navigate(Route::Home.path());
    }

    let mut rl = DefaultEditor::new()?;
    if let Some(history) = &config.shell.history_file {
        if rl.load_history(history).is_err() {
            tracing::debug!("No shell history at {}", history.display());
        }
    }

    print_welcome_banner(&assistant, config);

    loop {
        let prompt = format!("{} >> ", assistant.current_route().colored_tag());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let command = match parse_special_command(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}\n", e.to_string().red());
                        continue;
                    }
                };

                let outcome = match command {
                    SpecialCommand::Exit => break,
                    SpecialCommand::Help => {
                        print_help();
                        Ok(())
                    }
                    SpecialCommand::Go(path) => {
                        go(&mut assistant, &path);
                        Ok(())
                    }
                    SpecialCommand::Login => shell_login(&mut rl, &mut assistant).await,
                    SpecialCommand::Signup => shell_signup(&mut rl, &mut assistant).await,
                    SpecialCommand::Logout => {
                        assistant.logout().await;
                        println!("Logged out.");
                        Ok(())
                    }
                    SpecialCommand::Connect => connect(&mut assistant).await,
                    SpecialCommand::Upload(path) => upload(&mut assistant, &path).await,
                    SpecialCommand::History => {
                        print_history(&assistant);
                        Ok(())
                    }
                    SpecialCommand::Docs => {
                        render::print_uploaded(assistant.state().queries.uploaded_docs());
                        Ok(())
                    }
                    SpecialCommand::Schema => {
                        match assistant.state().queries.database_schema() {
                            Some(schema) => render::print_schema(schema),
                            None => println!("{}", "Not connected. Use /connect.".yellow()),
                        }
                        Ok(())
                    }
                    SpecialCommand::Whoami => {
                        render::print_session(&assistant.state().session);
                        Ok(())
                    }
                    SpecialCommand::None => ask(&mut assistant, trimmed).await,
                };

                if let Err(e) = outcome {
                    eprintln!("{}", format!("Error: {}", e).red());
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    if let Some(history) = &config.shell.history_file {
        if let Err(e) = rl.save_history(history) {
            tracing::warn!("Could not save shell history to {}: {}", history.display(), e);
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn go<B: Backend>(assistant: &mut Assistant<B>, path: &str) {
    match assistant.navigate(path) {
        Navigation::Proceed(route) => println!("Now on {}.", route),
        Navigation::Redirect(route) => println!(
            "{}",
            format!("Cannot open {}, redirected to {}.", path, route).yellow()
        ),
    }
}

/// Send plain input to the endpoint behind the current route.
async fn ask<B: Backend>(assistant: &mut Assistant<B>, text: &str) -> Result<()> {
    let Some(kind) = QueryKind::for_route(assistant.current_route()) else {
        println!(
            "{}",
            "Log in first (/login), or create an account (/signup).".yellow()
        );
        return Ok(());
    };

    match assistant.send_query(kind, text).await {
        Some(QueryOutcome::Agent(record)) => render::print_agent(&record),
        Some(QueryOutcome::Database(record)) => render::print_db(&record),
        Some(QueryOutcome::Documents(record)) => render::print_doc(&record),
        None => {
            let message = assistant.state().queries.error().unwrap_or("Query failed.");
            anyhow::bail!("{}", message);
        }
    }
    Ok(())
}

async fn shell_login<B: Backend>(rl: &mut DefaultEditor, assistant: &mut Assistant<B>) -> Result<()> {
    if let Navigation::Redirect(_) = assistant.navigate(Route::Login.path()) {
        println!("Already logged in. Use /logout first.");
        return Ok(());
    }
    let username = rl.readline("Username: ")?;
    let password = prompt_secret("Password: ")?;
    login(assistant, username.trim(), &password).await
}

async fn shell_signup<B: Backend>(
    rl: &mut DefaultEditor,
    assistant: &mut Assistant<B>,
) -> Result<()> {
    if let Navigation::Redirect(_) = assistant.navigate(Route::Signup.path()) {
        println!("Already logged in. Use /logout first.");
        return Ok(());
    }
    let request = SignupRequest {
        name: rl.readline("Name: ")?.trim().to_string(),
        email: rl.readline("Email: ")?.trim().to_string(),
        username: rl.readline("Username: ")?.trim().to_string(),
        password: prompt_secret("Password: ")?,
        role: rl.readline("Role: ")?.trim().to_string(),
    };
    signup(assistant, &request).await
}

/// Responses recorded for the current view, oldest first.
fn print_history<B: Backend>(assistant: &Assistant<B>) {
    let queries = &assistant.state().queries;
    let shown = match assistant.current_route() {
        Route::Home => {
            for record in queries.agent_records() {
                println!("{} {}", ">".purple(), record.query.bold());
                render::print_agent(record);
            }
            queries.agent_records().len()
        }
        Route::DbQuery => {
            for record in queries.db_records() {
                println!("{} {}", ">".cyan(), record.query.bold());
                render::print_db(record);
            }
            queries.db_records().len()
        }
        Route::DocQuery => {
            for record in queries.doc_records() {
                println!("{} {}", ">".green(), record.query.bold());
                render::print_doc(record);
            }
            queries.doc_records().len()
        }
        Route::Login | Route::Signup => 0,
    };
    if shown == 0 {
        println!("{}", "Nothing asked in this view yet.".yellow());
    }
}

fn print_welcome_banner<B: Backend>(assistant: &Assistant<B>, config: &Config) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                  querydesk interactive shell                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Backend: {}", config.api.base_url.cyan());
    match assistant.state().session.role() {
        Some(role) if assistant.state().session.is_authenticated() => {
            println!("Session: restored (role {})", role.green())
        }
        _ if assistant.state().session.is_authenticated() => println!("Session: restored"),
        _ => println!("Session: {}", "not logged in".yellow()),
    }
    println!("\nType '/help' for available commands, 'exit' to quit\n");
}
