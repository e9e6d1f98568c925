//! /state command - show the supervisor flags

use super::CommandResult;
use gavel_agent::ConversationState;

pub struct StateCommand;

impl StateCommand {
    pub fn execute(state: &ConversationState) -> CommandResult {
        let mut output = String::from("Chat State\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!("User:            {}\n", state.user_id()));
        for (key, value) in state.metadata() {
            output.push_str(&format!("  {:<14} {}\n", format!("{}:", key), value));
        }
        output.push_str(&format!("Messages:        {}\n", state.messages().len()));
        output.push('\n');

        output.push_str(&format!("Last agent:      {:?}\n", state.last_agent_used));
        output.push_str(&format!("API attempted:   {}\n", state.api_agent_attempted));
        output.push_str(&format!("SQL fallback:    {}\n", state.needs_sql_fallback));
        match &state.error {
            Some(error) => output.push_str(&format!("Last error:      {}", error)),
            None => output.push_str("Last error:      none"),
        }

        CommandResult::Message(output)
    }
}
