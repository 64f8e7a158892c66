// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `streamchat shell` command implementation.
//!
//! Interactive REPL with a colored prompt, readline history and live streaming
//! output taken from the engine event feed. Ctrl-C while a response is
//! streaming cancels that send; Ctrl-C or Ctrl-D at the prompt exits.

use std::io::Write;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use streamchat_core::{ChatError, Feedback, Role};
use streamchat_engine::{ChatEngine, EngineEvent, SendOutcome, Transcript};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::new_session_id;

/// One parsed line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Quit,
    /// Start a new session under a fresh id.
    New,
    Clear,
    Rate(Feedback),
    History,
    Unknown(String),
    Prompt(String),
}

/// Parses a line; blank input yields `None`.
pub fn parse_line(line: &str) -> Option<ShellCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let command = match trimmed {
        "/quit" | "/exit" => ShellCommand::Quit,
        "/new" => ShellCommand::New,
        "/clear" => ShellCommand::Clear,
        "/good" => ShellCommand::Rate(Feedback::Good),
        "/bad" => ShellCommand::Rate(Feedback::Bad),
        "/history" => ShellCommand::History,
        other if other.starts_with('/') => ShellCommand::Unknown(other.to_string()),
        other => ShellCommand::Prompt(other.to_string()),
    };
    Some(command)
}

/// Runs the REPL until `/quit` or end of input.
///
/// With `resume`, the engine's current session is loaded from the store first.
pub async fn run_shell(engine: &mut ChatEngine, resume: bool) -> Result<(), ChatError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| ChatError::Internal(format!("failed to initialize readline: {e}")))?;
    let mut events = engine.subscribe();
    let mut pending_feedback: Vec<JoinHandle<()>> = Vec::new();

    println!("{}", "streamchat shell".bold().green());
    if resume {
        let turns = engine.load_history(engine.session_id().clone()).await;
        println!(
            "{}",
            format!("resumed session {} ({turns} messages)", engine.session_id()).dimmed()
        );
        print_transcript(engine.transcript());
    } else {
        println!("{}", format!("session {}", engine.session_id()).dimmed());
    }
    println!("Type {} to exit.\n", "/quit".yellow());

    let prompt = format!("{}> ", "you".green());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        let Some(command) = parse_line(&line) else {
            continue;
        };
        let _ = rl.add_history_entry(line.trim());

        match command {
            ShellCommand::Quit => break,
            ShellCommand::New => {
                engine.switch_session(new_session_id());
                println!("{}", format!("session {}", engine.session_id()).dimmed());
            }
            ShellCommand::Clear => {
                engine.clear();
                println!("{}", "cleared".dimmed());
            }
            ShellCommand::History => print_transcript(engine.transcript()),
            ShellCommand::Rate(value) => {
                let Some(id) = engine.transcript().last_assistant().and_then(|t| t.id.clone())
                else {
                    println!("{}", "nothing to rate yet".yellow());
                    continue;
                };
                let receipt = engine.submit_feedback(&id, value);
                pending_feedback.extend(receipt.durable);
                println!("{}", format!("marked {value}").dimmed());
            }
            ShellCommand::Unknown(name) => {
                println!("{}", format!("unknown command {name}").yellow());
            }
            ShellCommand::Prompt(text) => {
                stream_reply(engine, &mut events, &text).await;
            }
        }
    }

    for handle in pending_feedback {
        let _ = handle.await;
    }
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Sends one prompt while rendering events and watching for Ctrl-C.
async fn stream_reply(
    engine: &mut ChatEngine,
    events: &mut mpsc::UnboundedReceiver<EngineEvent>,
    text: &str,
) {
    let cancel = engine.cancellation_token();
    let send = engine.send_message(text);
    tokio::pin!(send);

    let outcome = loop {
        tokio::select! {
            outcome = &mut send => break outcome,
            Some(event) = events.recv() => render_event(&event),
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupt received, cancelling send");
                cancel.cancel();
            }
        }
    };
    while let Ok(event) = events.try_recv() {
        render_event(&event);
    }

    match outcome {
        SendOutcome::Completed => println!(),
        SendOutcome::Failed(message) => eprintln!("\n{}", message.red()),
        SendOutcome::Skipped => {}
    }
}

fn render_event(event: &EngineEvent) {
    match event {
        EngineEvent::Fragment(text) => {
            print!("{text}");
            std::io::stdout().flush().ok();
        }
        EngineEvent::Retrying { attempt, delay } => {
            eprintln!(
                "\n{}",
                format!("(retry {attempt} in {}ms)", delay.as_millis()).dimmed()
            );
        }
        _ => {}
    }
}

/// Prints every turn with a role label, ids and feedback markers.
pub fn print_transcript(transcript: &Transcript) {
    for turn in transcript.turns() {
        let label = match turn.role {
            Role::User => "you".green(),
            Role::Assistant => "assistant".cyan(),
        };
        let mut meta = Vec::new();
        if turn.role == Role::Assistant {
            if let Some(id) = &turn.id {
                meta.push(id.to_string());
            }
        }
        if let Some(feedback) = turn.feedback {
            meta.push(feedback.to_string());
        }
        if meta.is_empty() {
            println!("{label}: {}", turn.content);
        } else {
            println!(
                "{label}: {} {}",
                turn.content,
                format!("[{}]", meta.join(", ")).dimmed()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   \t"), None);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(parse_line("/quit"), Some(ShellCommand::Quit));
        assert_eq!(parse_line(" /exit "), Some(ShellCommand::Quit));
        assert_eq!(parse_line("/new"), Some(ShellCommand::New));
        assert_eq!(parse_line("/clear"), Some(ShellCommand::Clear));
        assert_eq!(parse_line("/good"), Some(ShellCommand::Rate(Feedback::Good)));
        assert_eq!(parse_line("/bad"), Some(ShellCommand::Rate(Feedback::Bad)));
        assert_eq!(parse_line("/history"), Some(ShellCommand::History));
        assert_eq!(
            parse_line("/nope"),
            Some(ShellCommand::Unknown("/nope".into()))
        );
    }

    #[test]
    fn other_input_is_a_trimmed_prompt() {
        assert_eq!(
            parse_line("  hello there \n"),
            Some(ShellCommand::Prompt("hello there".into()))
        );
    }
}
