//! Transcript persistence for chats

use gavel_ai::Message;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from chat and transcript operations
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Chat session not found: {0}")]
    NotFound(String),

    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Transcript entry types for JSONL format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEntry {
    /// Transcript metadata
    Metadata {
        id: String,
        created_at: i64,
        user_id: String,
    },
    /// A message in the conversation
    Message { message: Message, timestamp: i64 },
}

/// Append-only JSONL transcript of one chat
pub struct SessionLog {
    id: String,
    writer: BufWriter<File>,
}

impl SessionLog {
    /// Get the sessions directory
    pub fn sessions_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gavel")
            .join("sessions")
    }

    /// Start a transcript for chat `id` in the default directory
    pub fn create(id: &str, user_id: &str) -> std::io::Result<Self> {
        Self::create_in(&Self::sessions_dir(), id, user_id)
    }

    /// Start a transcript for chat `id` in `dir`
    pub fn create_in(dir: &Path, id: &str, user_id: &str) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;

        let file = File::create(transcript_path(dir, id))?;
        let mut writer = BufWriter::new(file);

        let metadata = SessionEntry::Metadata {
            id: id.to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
            user_id: user_id.to_string(),
        };
        writeln!(writer, "{}", serde_json::to_string(&metadata)?)?;
        writer.flush()?;

        Ok(Self {
            id: id.to_string(),
            writer,
        })
    }

    /// Load a transcript from the default directory
    pub fn load(id: &str) -> Result<(Self, String, Vec<Message>), SessionError> {
        Self::load_from(&Self::sessions_dir(), id)
    }

    /// Load a transcript, returning the log (open for appending), the
    /// user id and the messages
    pub fn load_from(dir: &Path, id: &str) -> Result<(Self, String, Vec<Message>), SessionError> {
        let path = transcript_path(dir, id);
        if !path.exists() {
            return Err(SessionError::NotFound(id.to_string()));
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut lines = reader.lines();

        // The metadata line must parse; later lines are skipped if damaged
        let first_line = lines.next().transpose()?.unwrap_or_default();
        let user_id = match serde_json::from_str::<SessionEntry>(&first_line)? {
            SessionEntry::Metadata { user_id, .. } => user_id,
            SessionEntry::Message { .. } => {
                return Err(SessionError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("transcript {} has no metadata line", id),
                )));
            }
        };

        let mut messages = Vec::new();
        for line in lines {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<SessionEntry>(&line) {
                Ok(SessionEntry::Message { message, .. }) => messages.push(message),
                Ok(SessionEntry::Metadata { .. }) => {}
                Err(e) => tracing::warn!(session = %id, "Skipping unreadable transcript line: {}", e),
            }
        }

        let file = File::options().append(true).open(&path)?;
        Ok((
            Self {
                id: id.to_string(),
                writer: BufWriter::new(file),
            },
            user_id,
            messages,
        ))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a message to the transcript
    pub fn append_message(&mut self, message: &Message) -> std::io::Result<()> {
        let entry = SessionEntry::Message {
            message: message.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        writeln!(self.writer, "{}", serde_json::to_string(&entry)?)?;
        self.writer.flush()
    }

    /// List transcripts in the default directory
    pub fn list_sessions() -> std::io::Result<Vec<SessionInfo>> {
        Self::list_in(&Self::sessions_dir())
    }

    /// List transcripts in `dir`, newest first
    pub fn list_in(dir: &Path) -> std::io::Result<Vec<SessionInfo>> {
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut sessions = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                if let Some(info) = read_session_info(&path) {
                    sessions.push(info);
                }
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }
}

fn transcript_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.jsonl", id))
}

fn read_session_info(path: &Path) -> Option<SessionInfo> {
    let reader = BufReader::new(File::open(path).ok()?);
    let mut lines = reader.lines().map_while(Result::ok);

    let first_line = lines.next()?;
    let SessionEntry::Metadata {
        id,
        created_at,
        user_id,
    } = serde_json::from_str(&first_line).ok()?
    else {
        return None;
    };

    let message_count = lines
        .filter(|l| l.contains("\"type\":\"message\""))
        .count();

    Some(SessionInfo {
        id,
        created_at,
        user_id,
        message_count,
    })
}

/// Information about a saved transcript
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: String,
    pub created_at: i64,
    pub user_id: String,
    pub message_count: usize,
}

impl SessionInfo {
    /// Format the created_at timestamp for display
    pub fn created_at_display(&self) -> String {
        use chrono::{TimeZone, Utc};
        Utc.timestamp_millis_opt(self.created_at)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_ai::AgentKind;

    #[test]
    fn test_create_append_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SessionLog::create_in(dir.path(), "chat-1", "42").unwrap();
        log.append_message(&Message::user("how many bids?")).unwrap();
        log.append_message(&Message::agent(AgentKind::Sql, "17")).unwrap();
        drop(log);

        let (log, user_id, messages) = SessionLog::load_from(dir.path(), "chat-1").unwrap();
        assert_eq!(log.id(), "chat-1");
        assert_eq!(user_id, "42");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text(), "17");
        assert_eq!(messages[1].agent_kind(), Some(AgentKind::Sql));
    }

    #[test]
    fn test_loaded_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        SessionLog::create_in(dir.path(), "chat-2", "1").unwrap();

        let (mut log, _, messages) = SessionLog::load_from(dir.path(), "chat-2").unwrap();
        assert!(messages.is_empty());
        log.append_message(&Message::user("again")).unwrap();
        drop(log);

        let (_, _, messages) = SessionLog::load_from(dir.path(), "chat-2").unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = SessionLog::load_from(dir.path(), "missing");
        assert!(matches!(result, Err(SessionError::NotFound(ref id)) if id == "missing"));
    }

    #[test]
    fn test_damaged_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SessionLog::create_in(dir.path(), "chat-3", "1").unwrap();
        log.append_message(&Message::user("kept")).unwrap();
        drop(log);

        let path = dir.path().join("chat-3.jsonl");
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("{not json\n");
        fs::write(&path, content).unwrap();

        let (_, _, messages) = SessionLog::load_from(dir.path(), "chat-3").unwrap();
        assert_eq!(messages.len(), 1);

        fs::write(dir.path().join("bad.jsonl"), "garbage\n").unwrap();
        assert!(matches!(
            SessionLog::load_from(dir.path(), "bad"),
            Err(SessionError::Json(_))
        ));
    }

    #[test]
    fn test_list_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SessionLog::create_in(dir.path(), "a", "7").unwrap();
        log.append_message(&Message::user("hi")).unwrap();
        SessionLog::create_in(dir.path(), "b", "8").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sessions = SessionLog::list_in(dir.path()).unwrap();
        assert_eq!(sessions.len(), 2);
        let a = sessions.iter().find(|s| s.id == "a").unwrap();
        assert_eq!(a.user_id, "7");
        assert_eq!(a.message_count, 1);
        assert_ne!(a.created_at_display(), "unknown");
    }

    #[test]
    fn test_list_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionLog::list_in(&dir.path().join("none")).unwrap();
        assert!(sessions.is_empty());
    }
}
