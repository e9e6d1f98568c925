//! Slash commands for interactive mode

mod history;
mod state;

pub use history::HistoryCommand;
pub use state::StateCommand;

use crate::chat::HistoryEntry;
use gavel_agent::ConversationState;

/// Result of executing a slash command
#[derive(Debug)]
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Show a message to the user (not sent to the agents)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(
    input: &str,
    state: &ConversationState,
    history: &[HistoryEntry],
) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "history" => HistoryCommand::execute(args, history),

        "state" => StateCommand::execute(state),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /history [n]         Show the conversation (last n entries)
  /state               Show the supervisor flags for this chat
  /clear, /c           Clear conversation history
  /quit, /exit, /q     Exit gavel

Anything else is sent to the API agent first; the SQL agent answers when
the API agent can't."#
        .to_string()
}
