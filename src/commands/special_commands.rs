//! Special commands for the interactive assistant
//!
//! Commands are prefixed with `/` and are case-insensitive. Anything else
//! typed at the prompt is sent to the assistant.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },
}

/// Commands handled by the chat loop itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    Help,

    /// Reload the transcript from stored conversations
    History,

    /// Clear the visible transcript (stored records are kept)
    Clear,

    /// Switch the campaign the conversation is scoped to; `None` clears it
    Campaign(Option<i64>),

    /// Show session state
    Status,

    Exit,

    /// Not a special command; send it as a prompt
    None,
}

/// Parse a line typed at the chat prompt
///
/// # Errors
///
/// Returns [`CommandError`] for unknown commands or bad arguments.
///
/// # Examples
///
/// ```
/// use marketa::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/EXIT").unwrap(), SpecialCommand::Exit);
/// assert_eq!(parse_special_command("/campaign 4").unwrap(), SpecialCommand::Campaign(Some(4)));
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();

    match command.as_str() {
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/history" => Ok(SpecialCommand::History),
        "/clear" => Ok(SpecialCommand::Clear),
        "/status" => Ok(SpecialCommand::Status),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        "/campaign" => match arg {
            None => Ok(SpecialCommand::Campaign(None)),
            Some(a) if a.eq_ignore_ascii_case("none") => Ok(SpecialCommand::Campaign(None)),
            Some(a) => a
                .parse()
                .map(|id| SpecialCommand::Campaign(Some(id)))
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/campaign".to_string(),
                    arg: a.to_string(),
                }),
        },
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the special command reference
pub fn print_help() {
    println!(
        r#"
Assistant Commands
==================

  /history          - Reload the conversation from stored history
  /clear            - Clear the visible transcript
  /campaign <id>    - Scope the conversation to a campaign
  /campaign none    - Talk without a campaign
  /status           - Show the current campaign and transcript size
  /help             - Show this help
  /exit, /quit      - Leave the assistant

Anything else is sent to the assistant.
"#
    );
}
