//! The supervisor state machine: nodes, routes and the transition table.
//!
//! ```text
//! Start -> ApiStage -+-(Finish)--------> End
//!                    +-(ContinueToSql)-> SqlStage -> End
//! ```
//!
//! The graph is acyclic and every run visits at most four nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::conversation::ConversationState;

/// Nodes of the supervisor state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Start,
    ApiStage,
    SqlStage,
    End,
}

impl Node {
    pub fn name(&self) -> &'static str {
        match self {
            Node::Start => "start",
            Node::ApiStage => "api_stage",
            Node::SqlStage => "sql_stage",
            Node::End => "end",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Edge labels out of the API stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    ContinueToSql,
    Finish,
}

/// Branch decision after the API stage.
///
/// Reads only `needs_sql_fallback`; it never classifies text itself and
/// never touches the state.
pub fn should_fallback_to_sql(state: &ConversationState) -> Route {
    if state.needs_sql_fallback {
        Route::ContinueToSql
    } else {
        Route::Finish
    }
}

/// Transition table. Returns `None` once the run has reached `End`.
pub fn next_node(node: Node, state: &ConversationState) -> Option<Node> {
    match node {
        Node::Start => Some(Node::ApiStage),
        Node::ApiStage => Some(match should_fallback_to_sql(state) {
            Route::ContinueToSql => Node::SqlStage,
            Route::Finish => Node::End,
        }),
        Node::SqlStage => Some(Node::End),
        Node::End => None,
    }
}
