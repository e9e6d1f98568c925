//! In-memory chat sessions driven by the supervisor

use gavel_agent::{ConversationState, LastAgent, Orchestrator, StageError, create_initial_context};
use gavel_ai::{Message, Metadata};
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::session::SessionError;

/// Returned to the user when no agent ever answered
pub const NO_RESPONSE: &str = "No response";

/// Who is starting a chat
#[derive(Debug, Clone, Default)]
pub struct NewChat {
    pub user_id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl NewChat {
    /// Profile fields that are set, keyed by name
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        for (key, value) in [
            ("email", &self.email),
            ("username", &self.username),
            ("first_name", &self.first_name),
        ] {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value.clone());
            }
        }
        metadata
    }
}

/// One line of chat history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: &'static str,
    pub content: String,
}

/// Outcome of sending one message
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Latest agent response, or [`NO_RESPONSE`]
    pub message: String,
    pub last_agent_used: LastAgent,
    /// Whether this turn produced an agent message
    pub answered: bool,
    pub error: Option<StageError>,
}

/// Chats keyed by id
#[derive(Default)]
pub struct ChatSessions {
    sessions: Mutex<HashMap<String, ConversationState>>,
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a chat and return its id
    pub fn create(&self, chat: NewChat) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let state = create_initial_context(chat.user_id.clone(), None).with_metadata(chat.metadata());
        self.insert(id.clone(), state);
        tracing::debug!(chat_id = %id, user_id = %chat.user_id, "Chat created");
        id
    }

    /// Register an existing state under `id` (used when resuming)
    pub fn insert(&self, id: impl Into<String>, state: ConversationState) {
        self.sessions.lock().insert(id.into(), state);
    }

    /// Snapshot of a chat's state
    pub fn state(&self, id: &str) -> Result<ConversationState, SessionError> {
        self.sessions
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// User and assistant messages, oldest first
    pub fn history(&self, id: &str) -> Result<Vec<HistoryEntry>, SessionError> {
        Ok(history_of(&self.state(id)?))
    }

    /// Send a user message through the supervisor.
    ///
    /// Runs concurrently with other chats. Two sends on the same chat race,
    /// and the later one to finish wins.
    pub async fn send(
        &self,
        id: &str,
        text: &str,
        orchestrator: &Orchestrator,
    ) -> Result<ChatReply, SessionError> {
        let mut state = self.state(id)?;
        state.begin_turn(text);
        let before = state.messages().len();

        let state = orchestrator.invoke(state).await;

        let reply = ChatReply {
            message: state.final_response().unwrap_or(NO_RESPONSE).to_string(),
            last_agent_used: state.last_agent_used,
            answered: state.messages()[before..].iter().any(Message::is_agent),
            error: state.error.clone(),
        };
        self.insert(id, state);
        Ok(reply)
    }
}

/// History view of a conversation: system messages are left out
pub fn history_of(state: &ConversationState) -> Vec<HistoryEntry> {
    state
        .messages()
        .iter()
        .filter_map(|m| match m {
            Message::User { content, .. } => Some(HistoryEntry {
                role: "user",
                content: content.clone(),
            }),
            Message::Agent { content, .. } => Some(HistoryEntry {
                role: "assistant",
                content: content.clone(),
            }),
            Message::System { .. } => None,
        })
        .collect()
}
