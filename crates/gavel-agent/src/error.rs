//! Error descriptors recorded on the conversation state

use gavel_ai::AgentKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stage failure, recorded out-of-band on the state instead of being
/// raised to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    /// Stage whose adapter failed
    pub agent: AgentKind,
    /// Human-readable failure description
    pub message: String,
    /// Whether the adapter gave up waiting
    #[serde(default)]
    pub timeout: bool,
    /// Unix timestamp in milliseconds
    #[serde(default)]
    pub timestamp: i64,
}

impl StageError {
    /// Build a descriptor from an adapter error
    pub fn from_adapter(agent: AgentKind, error: &gavel_ai::Error) -> Self {
        Self {
            agent,
            message: error.to_string(),
            timeout: error.is_timeout(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} agent failed: {}", self.agent, self.message)
    }
}
