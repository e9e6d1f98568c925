//! The two stages of a run: call an agent, record what happened.

use gavel_ai::{AgentAdapter, AgentKind, Message};

use crate::{
    classifier::FallbackClassifier,
    conversation::{ConversationState, LastAgent},
    error::StageError,
};

/// What a single stage did to the state
#[derive(Debug, Clone, Default)]
pub(crate) struct StageReport {
    pub appended: Option<Message>,
    pub error: Option<StageError>,
    /// Indicator phrases found in the response (API stage only)
    pub matched: Vec<String>,
}

/// Run the API agent stage.
///
/// Never fails: an adapter error is recorded on the state and forces the
/// SQL fallback.
pub async fn run_api_agent(
    mut state: ConversationState,
    adapter: &dyn AgentAdapter,
    classifier: &FallbackClassifier,
) -> ConversationState {
    api_stage(&mut state, adapter, classifier).await;
    state
}

/// Run the SQL agent stage. Terminal: a failure is recorded and the run ends.
pub async fn run_sql_agent(
    mut state: ConversationState,
    adapter: &dyn AgentAdapter,
) -> ConversationState {
    sql_stage(&mut state, adapter).await;
    state
}

pub(crate) async fn api_stage(
    state: &mut ConversationState,
    adapter: &dyn AgentAdapter,
    classifier: &FallbackClassifier,
) -> StageReport {
    let outcome = call_agent(state, adapter, AgentKind::Api).await;
    state.api_agent_attempted = true;

    match outcome {
        Ok(message) => {
            let matched: Vec<String> = classifier
                .matched_indicators(message.text())
                .into_iter()
                .map(String::from)
                .collect();
            state.needs_sql_fallback = !matched.is_empty();
            state.last_agent_used = LastAgent::Api;
            state.append(message.clone());

            tracing::debug!(
                agent = %AgentKind::Api,
                fallback = state.needs_sql_fallback,
                matched = ?matched,
                "Classified API response"
            );

            StageReport {
                appended: Some(message),
                error: None,
                matched,
            }
        }
        Err(error) => {
            // Fail open: any API failure hands the request to the SQL agent
            state.needs_sql_fallback = true;
            state.error = Some(error.clone());
            StageReport {
                appended: None,
                error: Some(error),
                matched: vec![],
            }
        }
    }
}

pub(crate) async fn sql_stage(
    state: &mut ConversationState,
    adapter: &dyn AgentAdapter,
) -> StageReport {
    match call_agent(state, adapter, AgentKind::Sql).await {
        Ok(message) => {
            state.last_agent_used = LastAgent::Sql;
            state.append(message.clone());
            StageReport {
                appended: Some(message),
                ..Default::default()
            }
        }
        Err(error) => {
            state.error = Some(error.clone());
            StageReport {
                error: Some(error),
                ..Default::default()
            }
        }
    }
}

/// Call an adapter and normalize its reply into an agent message attributed
/// to `stage`. Non-agent replies count as failures.
async fn call_agent(
    state: &ConversationState,
    adapter: &dyn AgentAdapter,
    stage: AgentKind,
) -> Result<Message, StageError> {
    let result = adapter.invoke(state.as_request()).await;

    let reply = match result {
        Ok(Message::Agent {
            content, timestamp, ..
        }) => Ok(Message::Agent {
            content,
            agent: Some(stage),
            timestamp,
        }),
        Ok(other) => Err(gavel_ai::Error::UnexpectedResponse(format!(
            "expected an agent message, got a {:?} message",
            other.role()
        ))),
        Err(e) => Err(e),
    };

    reply.map_err(|e| {
        tracing::warn!(agent = %stage, error = %e, "Agent call failed");
        StageError::from_adapter(stage, &e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::create_initial_context;
    use async_trait::async_trait;
    use gavel_ai::AgentRequest;
    use std::time::Duration;

    /// Returns a fixed reply, or fails
    struct FixedAgent {
        kind: AgentKind,
        reply: Option<Message>,
    }

    impl FixedAgent {
        fn text(kind: AgentKind, text: &str) -> Self {
            Self {
                kind,
                reply: Some(Message::agent(kind, text)),
            }
        }

        fn failing(kind: AgentKind) -> Self {
            Self { kind, reply: None }
        }
    }

    #[async_trait]
    impl AgentAdapter for FixedAgent {
        fn kind(&self) -> AgentKind {
            self.kind
        }

        async fn invoke(&self, _request: AgentRequest<'_>) -> gavel_ai::Result<Message> {
            self.reply
                .clone()
                .ok_or_else(|| gavel_ai::Error::Timeout(Duration::from_secs(1)))
        }
    }

    #[tokio::test]
    async fn test_api_success_without_fallback() {
        let state = create_initial_context("1", Some("list items"));
        let agent = FixedAgent::text(AgentKind::Api, "Here are all catalogue items: [...]");

        let state = run_api_agent(state, &agent, &FallbackClassifier::default()).await;

        assert!(state.api_agent_attempted);
        assert!(!state.needs_sql_fallback);
        assert_eq!(state.last_agent_used, LastAgent::Api);
        assert_eq!(state.messages().len(), 2);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_api_success_with_fallback_phrase() {
        let state = create_initial_context("1", Some("how many bids?"));
        let agent = FixedAgent::text(AgentKind::Api, "I don't have statistics for that");

        let mut state = state;
        let report = api_stage(&mut state, &agent, &FallbackClassifier::default()).await;

        assert!(state.needs_sql_fallback);
        assert_eq!(report.matched, vec!["i don't have", "statistics"]);
        let appended = report.appended.expect("message appended");
        assert_eq!(appended.text(), "I don't have statistics for that");
    }

    #[tokio::test]
    async fn test_flag_follows_reported_matches() {
        let classifier = FallbackClassifier::with_indicators(["out of scope"]);
        for (text, expected) in [("That is Out Of Scope", true), ("I cannot", false), ("", false)] {
            let mut state = create_initial_context("1", Some("q"));
            let agent = FixedAgent::text(AgentKind::Api, text);

            let report = api_stage(&mut state, &agent, &classifier).await;

            assert_eq!(state.needs_sql_fallback, expected, "{:?}", text);
            assert_eq!(!report.matched.is_empty(), expected, "{:?}", text);
        }
    }

    #[tokio::test]
    async fn test_api_failure_forces_fallback() {
        let state = create_initial_context("1", Some("bid 10"));
        let agent = FixedAgent::failing(AgentKind::Api);

        let state = run_api_agent(state, &agent, &FallbackClassifier::default()).await;

        assert!(state.api_agent_attempted);
        assert!(state.needs_sql_fallback);
        assert_eq!(state.messages().len(), 1, "no fabricated message on failure");
        assert_eq!(state.last_agent_used, LastAgent::None);
        let error = state.error.expect("error recorded");
        assert_eq!(error.agent, AgentKind::Api);
        assert!(error.timeout);
    }

    #[tokio::test]
    async fn test_non_agent_reply_is_failure() {
        let state = create_initial_context("1", Some("hi"));
        let agent = FixedAgent {
            kind: AgentKind::Api,
            reply: Some(Message::user("echo")),
        };

        let state = run_api_agent(state, &agent, &FallbackClassifier::default()).await;

        assert!(state.needs_sql_fallback);
        assert_eq!(state.messages().len(), 1);
        assert!(state.error.unwrap().message.contains("expected an agent message"));
    }

    #[tokio::test]
    async fn test_reply_is_attributed_to_stage() {
        let state = create_initial_context("1", Some("hi"));
        let agent = FixedAgent {
            kind: AgentKind::Sql,
            reply: Some(Message::Agent {
                content: "rows".into(),
                agent: None,
                timestamp: 0,
            }),
        };

        let state = run_sql_agent(state, &agent).await;

        assert_eq!(state.messages().last().and_then(|m| m.agent_kind()), Some(AgentKind::Sql));
        assert_eq!(state.last_agent_used, LastAgent::Sql);
    }

    #[tokio::test]
    async fn test_sql_failure_records_error_only() {
        let mut state = create_initial_context("1", Some("report"));
        state.last_agent_used = LastAgent::Api;
        let agent = FixedAgent::failing(AgentKind::Sql);

        let state = run_sql_agent(state, &agent).await;

        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.last_agent_used, LastAgent::Api);
        assert_eq!(state.error.unwrap().agent, AgentKind::Sql);
    }
}
