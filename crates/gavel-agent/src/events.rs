//! Supervisor event types

use gavel_ai::{AgentKind, Message};
use serde::{Deserialize, Serialize};

use crate::{
    conversation::LastAgent,
    error::StageError,
    graph::{Node, Route},
};

/// Events emitted during a supervisor run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    /// A run started
    RunStart { user_id: String },

    /// The state machine entered a node
    NodeEntered { node: Node },

    /// A stage finished, successfully or not
    StageEnd {
        agent: AgentKind,
        appended: Option<Message>,
        error: Option<StageError>,
    },

    /// The branch after the API stage was decided
    FallbackDecision {
        route: Route,
        /// Indicator phrases found in the API response
        matched: Vec<String>,
    },

    /// The run reached the end node
    RunEnd {
        last_agent_used: LastAgent,
        path: Vec<Node>,
    },
}

impl OrchestratorEvent {
    /// Check if this is a terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestratorEvent::RunEnd { .. })
    }
}
