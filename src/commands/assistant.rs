//! Assistant command handler
//!
//! Runs either a single prompt or a readline chat loop. Turn progress is
//! rendered from the session's [`TurnEvent`] channel, so streamed replies
//! appear as they arrive.

use crate::assistant::{
    build_exchange, AssistantSession, Message, TurnEvent, TurnOutcome, TIMEOUT_MESSAGE,
};
use crate::auth::Route;
use crate::commands::open_dashboard;
use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::config::Config;
use crate::error::{MarketaError, Result};
use crate::notice::NoticeVariant;
use crate::store::RecordStore;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Start the assistant
pub async fn run_assistant(
    config: &Config,
    campaign: Option<i64>,
    prompt: Option<String>,
) -> Result<()> {
    let (session, store) = open_dashboard(config, Route::Assistant)?;
    tracing::info!("Starting assistant in {} mode", config.assistant.mode);

    let store: Arc<dyn RecordStore> = store;
    let exchange = build_exchange(config, Arc::clone(&store), &session.access_token)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let renderer = tokio::spawn(render_events(rx));

    let mut assistant = AssistantSession::new(store, exchange, session.user.id)
        .with_campaign(campaign)
        .with_events(tx);

    let result = match prompt {
        Some(prompt) => single_turn(&mut assistant, &prompt).await,
        None => chat_loop(&mut assistant).await,
    };

    // Dropping the session closes the event channel and ends the renderer.
    drop(assistant);
    if let Err(e) = renderer.await {
        tracing::warn!("Event renderer stopped abnormally: {}", e);
    }
    result
}

async fn single_turn(assistant: &mut AssistantSession, prompt: &str) -> Result<()> {
    match assistant.send(prompt).await {
        TurnOutcome::Completed { .. } => Ok(()),
        TurnOutcome::Ignored => {
            Err(MarketaError::Validation("Prompt cannot be empty".to_string()).into())
        }
        TurnOutcome::TimedOut => Err(anyhow::anyhow!(TIMEOUT_MESSAGE)),
        TurnOutcome::Failed(message) => Err(anyhow::anyhow!(message)),
    }
}

async fn chat_loop(assistant: &mut AssistantSession) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    print_welcome_banner(assistant.campaign_id());

    if let Err(e) = assistant.load_history().await {
        eprintln!("{}", format!("Could not load history: {}", e).yellow());
    }
    print_transcript(assistant.transcript().messages());

    loop {
        match rl.readline(&format!("{} ", "you>".cyan().bold())) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match parse_special_command(trimmed) {
                    Ok(SpecialCommand::None) => {}
                    Ok(SpecialCommand::Help) => {
                        print_help();
                        continue;
                    }
                    Ok(SpecialCommand::History) => {
                        match assistant.load_history().await {
                            Ok(_) => print_transcript(assistant.transcript().messages()),
                            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                        }
                        continue;
                    }
                    Ok(SpecialCommand::Clear) => {
                        assistant.clear();
                        println!("Transcript cleared.");
                        continue;
                    }
                    Ok(SpecialCommand::Campaign(id)) => {
                        match id {
                            Some(id) => println!("Talking about campaign {}.", id),
                            None => println!("No campaign selected."),
                        }
                        match assistant.switch_campaign(id).await {
                            Ok(_) => print_transcript(assistant.transcript().messages()),
                            Err(e) => {
                                eprintln!("{}", format!("Could not load history: {}", e).yellow())
                            }
                        }
                        continue;
                    }
                    Ok(SpecialCommand::Status) => {
                        println!(
                            "Campaign: {}  Messages: {}  State: {}",
                            assistant
                                .campaign_id()
                                .map(|id| id.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            assistant.transcript().len(),
                            assistant.state()
                        );
                        continue;
                    }
                    Ok(SpecialCommand::Exit) => break,
                    Err(e) => {
                        eprintln!("{}", e.to_string().red());
                        continue;
                    }
                }

                assistant.send(trimmed).await;
                // Let the renderer catch up before the next prompt.
                tokio::task::yield_now().await;
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

    println!("Goodbye!");
    Ok(())
}

fn print_welcome_banner(campaign: Option<i64>) {
    println!("\n{}", "Marketa Campaign Assistant".bold());
    match campaign {
        Some(id) => println!("Campaign: {}", id.to_string().cyan()),
        None => println!("Campaign: {}", "none".dimmed()),
    }
    println!("Type '/help' for available commands, '/exit' to quit\n");
}

fn print_transcript(messages: &[Message]) {
    for message in messages {
        print_message(message);
    }
}

fn print_message(message: &Message) {
    if message.is_user {
        println!("{} {}", "you>".cyan().bold(), message.content);
    } else if message.is_error() {
        println!("{}", message.content.red());
    } else {
        println!("{} {}", "marketa>".magenta().bold(), message.content);
    }
}

/// Whether an appended message is printed by the renderer
///
/// The user's own line is already on screen, and an error is shown by its
/// notice.
fn shown_on_append(message: &Message) -> bool {
    !message.is_user && !message.is_error()
}

/// Print turn events as they arrive
///
/// Ends when every sender has been dropped.
pub async fn render_events(mut rx: mpsc::UnboundedReceiver<TurnEvent>) {
    let mut revealing: Option<String> = None;

    while let Some(event) = rx.recv().await {
        match event {
            TurnEvent::MessageAppended(message) => {
                if !shown_on_append(&message) {
                    continue;
                }
                if message.content.is_empty() {
                    print!("{} ", "marketa>".magenta().bold());
                    let _ = std::io::stdout().flush();
                    revealing = Some(message.id);
                } else {
                    print_message(&message);
                }
            }
            TurnEvent::DeltaAppended { id, delta } => {
                if revealing.as_deref() == Some(id.as_str()) {
                    print!("{}", delta);
                    let _ = std::io::stdout().flush();
                }
            }
            TurnEvent::MessageUpdated { id, content } => {
                // Polling fills the reply in one go; a streamed reply has
                // already been printed delta by delta.
                if revealing.as_deref() == Some(id.as_str()) {
                    println!("{}", content);
                    revealing = None;
                }
            }
            TurnEvent::MessageRemoved { id } => {
                if revealing.as_deref() == Some(id.as_str()) {
                    println!();
                    revealing = None;
                }
            }
            TurnEvent::StateChanged(state) => {
                tracing::debug!("Turn state: {}", state);
                if state.accepts_input() && revealing.take().is_some() {
                    println!();
                }
            }
            TurnEvent::Notice(notice) => {
                let text = notice.to_string();
                match notice.variant {
                    NoticeVariant::Destructive => eprintln!("{}", text.red()),
                    NoticeVariant::Info => println!("{}", text.green()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::Notice;

    #[test]
    fn test_errors_are_left_to_their_notice() {
        assert!(!shown_on_append(&Message::user("hello")));
        assert!(!shown_on_append(&Message::error("Rate limits exceeded")));
        assert!(shown_on_append(&Message::placeholder()));
    }

    #[tokio::test]
    async fn test_render_events_drains_until_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        let renderer = tokio::spawn(render_events(rx));

        let reply = Message::placeholder();
        tx.send(TurnEvent::MessageAppended(reply.clone())).unwrap();
        tx.send(TurnEvent::DeltaAppended {
            id: reply.id.clone(),
            delta: "Hi".to_string(),
        })
        .unwrap();
        tx.send(TurnEvent::MessageAppended(Message::error("boom")))
            .unwrap();
        tx.send(TurnEvent::Notice(Notice::destructive("Error", "boom")))
            .unwrap();
        drop(tx);

        renderer.await.unwrap();
    }
}
