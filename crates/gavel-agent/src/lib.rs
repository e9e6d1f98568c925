//! gavel-agent: Supervisor over the API and SQL agents
//!
//! Every request goes to the API agent first. Its answer is checked against a
//! table of indicator phrases; if the API agent could not help (or failed
//! outright) the SQL agent gets the conversation next.

pub mod classifier;
pub mod conversation;
pub mod error;
pub mod events;
pub mod graph;
pub mod orchestrator;
pub mod stage;

pub use classifier::{FALLBACK_INDICATORS, FallbackClassifier, needs_sql_fallback};
pub use conversation::{ConversationState, LastAgent, create_initial_context};
pub use error::StageError;
pub use events::OrchestratorEvent;
pub use graph::{Node, Route, next_node, should_fallback_to_sql};
pub use orchestrator::Orchestrator;
pub use stage::{run_api_agent, run_sql_agent};
