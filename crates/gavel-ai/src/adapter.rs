//! Adapter trait the supervisor uses to call agents

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{AgentKind, Message, Result};

/// Free-form user metadata (email, username, ...) forwarded to agents untouched
pub type Metadata = BTreeMap<String, String>;

/// Everything an agent receives for one invocation
#[derive(Debug, Clone, Copy)]
pub struct AgentRequest<'a> {
    /// Opaque identifier of the requester
    pub user_id: &'a str,
    /// Full conversation history, oldest first
    pub messages: &'a [Message],
    /// User metadata attached to the conversation
    pub metadata: &'a Metadata,
}

impl<'a> AgentRequest<'a> {
    /// Text of the most recent user message, or "" if there is none
    pub fn latest_user_text(&self) -> &'a str {
        self.messages
            .iter()
            .rev()
            .find(|m| matches!(m, Message::User { .. }))
            .map(|m| m.text())
            .unwrap_or("")
    }
}

/// A black-box agent the supervisor can call
///
/// Implementations return exactly one response message on success. A failure,
/// whether raised by transport or reported by the agent itself, is an `Err`.
/// Adapters own their own timeouts; the caller never imposes one.
#[async_trait]
pub trait AgentAdapter: Send + Sync {
    /// Which agent this adapter talks to
    fn kind(&self) -> AgentKind;

    /// Run the agent over the conversation and return its response
    async fn invoke(&self, request: AgentRequest<'_>) -> Result<Message>;
}

/// Type alias for a shared adapter
pub type BoxedAdapter = Arc<dyn AgentAdapter>;

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAgent;

    #[async_trait]
    impl AgentAdapter for EchoAgent {
        fn kind(&self) -> AgentKind {
            AgentKind::Api
        }

        async fn invoke(&self, request: AgentRequest<'_>) -> Result<Message> {
            Ok(Message::agent(
                self.kind(),
                format!("{}: {}", request.user_id, request.latest_user_text()),
            ))
        }
    }

    #[tokio::test]
    async fn test_adapter_receives_history() {
        let agent: BoxedAdapter = Arc::new(EchoAgent);
        let messages = vec![
            Message::user("list items"),
            Message::agent(AgentKind::Api, "here you go"),
            Message::user("place a bid"),
        ];
        let metadata = Metadata::new();
        let request = AgentRequest {
            user_id: "7",
            messages: &messages,
            metadata: &metadata,
        };

        let reply = agent.invoke(request).await.unwrap();
        assert_eq!(reply.text(), "7: place a bid");
        assert_eq!(reply.agent_kind(), Some(AgentKind::Api));
    }

    #[test]
    fn test_latest_user_text_empty_history() {
        let metadata = Metadata::new();
        let request = AgentRequest {
            user_id: "1",
            messages: &[],
            metadata: &metadata,
        };
        assert_eq!(request.latest_user_text(), "");
    }
}
