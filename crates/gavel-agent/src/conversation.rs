//! Conversation state threaded through a supervisor run.

use gavel_ai::{AgentKind, AgentRequest, Message, Metadata};
use serde::{Deserialize, Serialize};

use crate::error::StageError;

/// Which stage completed most recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastAgent {
    #[default]
    None,
    Api,
    Sql,
}

impl From<AgentKind> for LastAgent {
    fn from(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Api => LastAgent::Api,
            AgentKind::Sql => LastAgent::Sql,
        }
    }
}

/// Conversation state: message history plus orchestration flags.
///
/// `messages` only grows. Entries are appended by the stages (agent
/// responses) or by the host starting a new turn (user messages); nothing
/// is edited or removed once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
    user_id: String,
    /// User metadata forwarded to agents
    #[serde(default)]
    metadata: Metadata,
    /// Most recently completed stage
    pub last_agent_used: LastAgent,
    /// Set once the API stage has run, whatever its outcome
    pub api_agent_attempted: bool,
    /// Set by the API stage; read by the branch decision
    pub needs_sql_fallback: bool,
    /// Most recent stage failure
    pub error: Option<StageError>,
}

/// Create the state for a new conversation.
pub fn create_initial_context(
    user_id: impl Into<String>,
    first_message: Option<&str>,
) -> ConversationState {
    ConversationState {
        messages: first_message.map(Message::user).into_iter().collect(),
        user_id: user_id.into(),
        metadata: Metadata::new(),
        last_agent_used: LastAgent::None,
        api_agent_attempted: false,
        needs_sql_fallback: false,
        error: None,
    }
}

impl ConversationState {
    /// Rebuild a state from a saved transcript.
    pub fn restore(user_id: impl Into<String>, messages: Vec<Message>) -> Self {
        let mut state = create_initial_context(user_id, None);
        state.messages = messages;
        state
    }

    /// Attach user metadata (email, username, ...).
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Start a new user turn.
    ///
    /// Appends the user message and clears the per-run flags so the next
    /// run starts from the API stage again.
    pub fn begin_turn(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
        self.api_agent_attempted = false;
        self.needs_sql_fallback = false;
        self.error = None;
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Text of the latest agent response, if any.
    pub fn final_response(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_agent())
            .map(|m| m.text())
    }

    /// Borrow the state as an adapter request.
    pub fn as_request(&self) -> AgentRequest<'_> {
        AgentRequest {
            user_id: &self.user_id,
            messages: &self.messages,
            metadata: &self.metadata,
        }
    }

    pub(crate) fn append(&mut self, message: Message) {
        self.messages.push(message);
    }
}
