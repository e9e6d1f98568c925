//! Adapter for agents exposed as HTTP services

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::{
    adapter::{AgentAdapter, AgentRequest, Metadata},
    error::{Error, Result},
    types::{AgentKind, Message},
};

/// Default time to wait for an agent before giving up
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP agent client
///
/// Posts the conversation as JSON and expects `{"message": "..."}` back.
/// A body of `{"error": "..."}` or a non-success status is an agent failure.
pub struct HttpAgent {
    client: reqwest::Client,
    kind: AgentKind,
    endpoint: String,
    timeout: Duration,
    headers: HashMap<String, String>,
}

impl HttpAgent {
    /// Create a new HTTP agent for `kind` at `endpoint`
    pub fn new(kind: AgentKind, endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            kind,
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            headers: HashMap::new(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add extra headers sent with every request
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Endpoint this agent posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        for (key, value) in &self.headers {
            if let (Ok(name), Ok(val)) = (
                key.parse::<reqwest::header::HeaderName>(),
                value.parse::<reqwest::header::HeaderValue>(),
            ) {
                headers.insert(name, val);
            } else {
                tracing::warn!(agent = %self.kind, header = %key, "Skipping invalid header");
            }
        }
        headers
    }

    async fn send(&self, body: &WireRequest<'_>) -> Result<Message> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.build_headers())
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        parse_response(self.kind, status, &text)
    }
}

#[async_trait]
impl AgentAdapter for HttpAgent {
    fn kind(&self) -> AgentKind {
        self.kind
    }

    async fn invoke(&self, request: AgentRequest<'_>) -> Result<Message> {
        let body = build_request(&request);
        tracing::debug!(
            agent = %self.kind,
            endpoint = %self.endpoint,
            messages = body.messages.len(),
            question = %request.latest_user_text(),
            "Calling agent"
        );

        match tokio::time::timeout(self.timeout, self.send(&body)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.timeout)),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    user_id: &'a str,
    messages: Vec<WireMessage<'a>>,
    metadata: &'a Metadata,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireResponse {
    message: Option<String>,
    error: Option<String>,
}

fn wire_role(message: &Message) -> &'static str {
    match message {
        Message::User { .. } => "user",
        Message::Agent { .. } => "assistant",
        Message::System { .. } => "system",
    }
}

fn build_request<'a>(request: &AgentRequest<'a>) -> WireRequest<'a> {
    WireRequest {
        user_id: request.user_id,
        messages: request
            .messages
            .iter()
            .map(|m| WireMessage {
                role: wire_role(m),
                content: m.text(),
            })
            .collect(),
        metadata: request.metadata,
    }
}

/// Turn a raw HTTP response into an agent message or an error
fn parse_response(kind: AgentKind, status: u16, body: &str) -> Result<Message> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_str::<WireResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| body.trim().to_string());
        return Err(Error::api(status, detail));
    }

    let parsed: WireResponse = serde_json::from_str(body)?;
    match (parsed.message, parsed.error) {
        (_, Some(error)) if !error.is_empty() => Err(Error::Agent(error)),
        (Some(message), _) => Ok(Message::agent(kind, message)),
        _ => Err(Error::UnexpectedResponse(format!(
            "{} agent response has no message",
            kind
        ))),
    }
}
