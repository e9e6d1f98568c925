//! The supervisor: runs the API agent first and the SQL agent only when the
//! API agent's answer calls for it.

use gavel_ai::BoxedAdapter;
use tokio::sync::broadcast;

use crate::{
    classifier::FallbackClassifier,
    conversation::ConversationState,
    events::OrchestratorEvent,
    graph::{Node, next_node, should_fallback_to_sql},
    stage::{StageReport, api_stage, sql_stage},
};

/// Supervisor over the API and SQL agents.
///
/// Built once by the host and shared; every run owns its own
/// [`ConversationState`], so concurrent runs need no locking.
pub struct Orchestrator {
    api: BoxedAdapter,
    sql: BoxedAdapter,
    classifier: FallbackClassifier,
    event_tx: broadcast::Sender<OrchestratorEvent>,
}

impl Orchestrator {
    /// Create a supervisor with the default fallback phrase table
    pub fn new(api: BoxedAdapter, sql: BoxedAdapter) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            api,
            sql,
            classifier: FallbackClassifier::default(),
            event_tx,
        }
    }

    /// Replace the fallback classifier
    pub fn with_classifier(mut self, classifier: FallbackClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &FallbackClassifier {
        &self.classifier
    }

    /// Subscribe to run events
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.event_tx.subscribe()
    }

    /// Run the state machine from `Start` to `End` and return the terminal state.
    ///
    /// Infallible: adapter failures are recorded on the returned state's
    /// `error` field. Callers read `final_response()` and `last_agent_used`.
    pub async fn invoke(&self, mut state: ConversationState) -> ConversationState {
        tracing::info!(user_id = %state.user_id(), "Supervisor run started");
        self.emit(OrchestratorEvent::RunStart {
            user_id: state.user_id().to_string(),
        });

        let mut node = Node::Start;
        let mut path = vec![node];

        while let Some(next) = next_node(node, &state) {
            node = next;
            path.push(node);
            self.emit(OrchestratorEvent::NodeEntered { node });

            match node {
                Node::ApiStage => {
                    let report = api_stage(&mut state, self.api.as_ref(), &self.classifier).await;
                    let matched = report.matched.clone();
                    self.emit_stage_end(gavel_ai::AgentKind::Api, report);

                    let route = should_fallback_to_sql(&state);
                    tracing::info!(route = ?route, "API stage finished");
                    self.emit(OrchestratorEvent::FallbackDecision { route, matched });
                }
                Node::SqlStage => {
                    let report = sql_stage(&mut state, self.sql.as_ref()).await;
                    self.emit_stage_end(gavel_ai::AgentKind::Sql, report);
                }
                Node::Start | Node::End => {}
            }
        }

        tracing::info!(
            user_id = %state.user_id(),
            last_agent = ?state.last_agent_used,
            failed = state.error.is_some(),
            "Supervisor run finished"
        );
        self.emit(OrchestratorEvent::RunEnd {
            last_agent_used: state.last_agent_used,
            path,
        });

        state
    }

    fn emit_stage_end(&self, agent: gavel_ai::AgentKind, report: StageReport) {
        self.emit(OrchestratorEvent::StageEnd {
            agent,
            appended: report.appended,
            error: report.error,
        });
    }

    fn emit(&self, event: OrchestratorEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
