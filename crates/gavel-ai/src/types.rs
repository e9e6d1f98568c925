//! Core message types exchanged with agents

use serde::{Deserialize, Serialize};
use std::fmt;

/// The specialized agents the supervisor can call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Performs direct operations against the auction service
    Api,
    /// Answers analytical questions with database queries
    Sql,
}

impl AgentKind {
    /// Stable lowercase name used in logs and serialized state
    pub fn name(&self) -> &'static str {
        match self {
            AgentKind::Api => "api",
            AgentKind::Sql => "sql",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
    System,
}

/// A single entry in the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// User message
    User {
        content: String,
        #[serde(default)]
        timestamp: i64,
    },
    /// Agent response
    Agent {
        content: String,
        /// Which agent produced the response, when known
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<AgentKind>,
        #[serde(default)]
        timestamp: i64,
    },
    /// System note
    System {
        content: String,
        #[serde(default)]
        timestamp: i64,
    },
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            content: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create an agent response attributed to `agent`
    pub fn agent(agent: AgentKind, text: impl Into<String>) -> Self {
        Self::Agent {
            content: text.into(),
            agent: Some(agent),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::System {
            content: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Get the role of this message
    pub fn role(&self) -> Role {
        match self {
            Self::User { .. } => Role::User,
            Self::Agent { .. } => Role::Agent,
            Self::System { .. } => Role::System,
        }
    }

    /// Get the text content
    pub fn text(&self) -> &str {
        match self {
            Self::User { content, .. } => content,
            Self::Agent { content, .. } => content,
            Self::System { content, .. } => content,
        }
    }

    /// Whether this is an agent response
    pub fn is_agent(&self) -> bool {
        matches!(self, Self::Agent { .. })
    }

    /// The agent that produced this message, if it is an attributed agent response
    pub fn agent_kind(&self) -> Option<AgentKind> {
        match self {
            Self::Agent { agent, .. } => *agent,
            _ => None,
        }
    }

    /// Unix timestamp in milliseconds
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::User { timestamp, .. }
            | Self::Agent { timestamp, .. }
            | Self::System { timestamp, .. } => *timestamp,
        }
    }
}
