// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streamchat - streaming chat client with durable, resumable sessions.
//!
//! This is the binary entry point. Every subcommand drives a `ChatEngine`
//! wired to the HTTP endpoint, the access-token provider and the SQLite store.

mod doctor;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use streamchat_config::StreamchatConfig;
use streamchat_core::{ChatError, Feedback, MessageId, Role, SessionId};
use streamchat_engine::{ChatEngine, EngineOptions};
use streamchat_sse::{HttpEndpoint, TokenCredentials};
use streamchat_storage::SqliteStore;

/// Streamchat - streaming chat client with durable, resumable sessions.
#[derive(Parser, Debug)]
#[command(name = "streamchat", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Launch an interactive chat session (the default).
    Shell {
        /// Resume an existing session instead of starting a new one.
        #[arg(long)]
        session: Option<String>,
    },
    /// List sessions, most recently updated first.
    Sessions,
    /// Print the stored transcript of a session.
    History { session: String },
    /// Delete a session and all of its messages.
    Delete { session: String },
    /// Rate a stored assistant response.
    Feedback {
        session: String,
        message_id: String,
        /// `good` or `bad`.
        value: Feedback,
    },
    /// Check the endpoint, credentials and store.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => streamchat_config::load_and_validate_path(path),
        None => streamchat_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            streamchat_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.general.log_level);

    let command = cli.command.unwrap_or(Commands::Shell { session: None });
    if let Err(e) = run(command, config).await {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: StreamchatConfig) -> Result<(), ChatError> {
    if let Commands::Doctor { plain } = command {
        return doctor::run_doctor(&config, plain).await;
    }

    let store = Arc::new(SqliteStore::open(&config.storage).await?);
    let session = match &command {
        Commands::Shell {
            session: Some(session),
        }
        | Commands::History { session }
        | Commands::Feedback { session, .. } => SessionId::from(session.as_str()),
        _ => new_session_id(),
    };
    let mut engine = build_engine(&config, session, store.clone())?;

    let result = match command {
        Commands::Shell { session } => shell::run_shell(&mut engine, session.is_some()).await,
        Commands::Sessions => list_sessions(&engine).await,
        Commands::History { session } => print_history(&mut engine, session).await,
        Commands::Delete { session } => {
            engine.delete_session(&SessionId::from(session.as_str())).await?;
            println!("deleted session {session}");
            Ok(())
        }
        Commands::Feedback {
            message_id, value, ..
        } => rate_message(&mut engine, message_id, value).await,
        Commands::Doctor { .. } => Ok(()),
    };

    store.close().await?;
    result
}

/// Wires an engine to the configured collaborators.
fn build_engine(
    config: &StreamchatConfig,
    session: SessionId,
    store: Arc<SqliteStore>,
) -> Result<ChatEngine, ChatError> {
    let endpoint = Arc::new(HttpEndpoint::new(&config.endpoint)?);
    let credentials = Arc::new(TokenCredentials::new(&config.auth));
    Ok(ChatEngine::new(
        session,
        endpoint,
        credentials,
        store,
        EngineOptions::from_config(&config.retry),
    ))
}

/// A fresh caller-side session id.
pub(crate) fn new_session_id() -> SessionId {
    SessionId(uuid::Uuid::new_v4().to_string())
}

async fn list_sessions(engine: &ChatEngine) -> Result<(), ChatError> {
    let sessions = engine.list_sessions().await?;
    if sessions.is_empty() {
        println!("{}", "no sessions".dimmed());
        return Ok(());
    }
    for session in sessions {
        println!(
            "{}  {}  {}",
            session.session_id.as_str().cyan(),
            session.updated_at.dimmed(),
            session.name
        );
    }
    Ok(())
}

async fn print_history(engine: &mut ChatEngine, session: String) -> Result<(), ChatError> {
    let turns = engine.load_history(SessionId(session.clone())).await;
    if turns == 0 {
        println!("{}", format!("no messages in session {session}").dimmed());
        return Ok(());
    }
    shell::print_transcript(engine.transcript());
    Ok(())
}

async fn rate_message(
    engine: &mut ChatEngine,
    message_id: String,
    value: Feedback,
) -> Result<(), ChatError> {
    engine.load_history(engine.session_id().clone()).await;
    let id = MessageId(message_id);
    let is_assistant = engine
        .transcript()
        .turns()
        .iter()
        .any(|t| t.role == Role::Assistant && t.id.as_ref() == Some(&id));
    if !is_assistant {
        return Err(ChatError::Internal(format!(
            "message {id} not found in session {}",
            engine.session_id()
        )));
    }

    let receipt = engine.submit_feedback(&id, value);
    if let Some(durable) = receipt.durable {
        durable
            .await
            .map_err(|e| ChatError::Internal(format!("feedback task failed: {e}")))?;
    }
    println!("recorded {value} feedback for {id}");
    Ok(())
}

/// Installs the stderr subscriber; `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("streamchat={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_shell() {
        let cli = Cli::try_parse_from(["streamchat"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn shell_accepts_session() {
        let cli = Cli::try_parse_from(["streamchat", "shell", "--session", "abc"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Shell {
                session: Some("abc".into())
            })
        );
    }

    #[test]
    fn feedback_parses_value() {
        let cli =
            Cli::try_parse_from(["streamchat", "feedback", "s-1", "m-1", "good"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Feedback {
                session: "s-1".into(),
                message_id: "m-1".into(),
                value: Feedback::Good,
            })
        );
        assert!(Cli::try_parse_from(["streamchat", "feedback", "s", "m", "meh"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["streamchat", "sessions", "--config", "/tmp/x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
        assert_eq!(cli.command, Some(Commands::Sessions));
    }

    #[test]
    fn session_ids_are_fresh() {
        assert_ne!(new_session_id(), new_session_id());
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = streamchat_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.general.log_level, "info");
    }
}
