//! /history command - print the conversation

use super::CommandResult;
use crate::chat::HistoryEntry;
use crate::utils::{single_line, truncate_chars};

const PREVIEW_CHARS: usize = 120;

pub struct HistoryCommand;

impl HistoryCommand {
    pub fn execute(args: &str, history: &[HistoryEntry]) -> CommandResult {
        if history.is_empty() {
            return CommandResult::Message("No messages yet.".to_string());
        }

        let limit = match args {
            "" => history.len(),
            n => match n.parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    return CommandResult::Message(format!("Usage: /history [n] (got '{}')", n));
                }
            },
        };

        let skip = history.len().saturating_sub(limit);
        let lines: Vec<String> = history
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, entry)| {
                format!(
                    "{:>3}  {:<9}  {}",
                    i,
                    entry.role,
                    truncate_chars(&single_line(&entry.content), PREVIEW_CHARS)
                )
            })
            .collect();

        CommandResult::Message(lines.join("\n"))
    }
}
