//! Configuration file support

use crate::chat::NewChat;
use gavel_agent::FallbackClassifier;
use gavel_ai::{AgentKind, providers::HttpAgent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for gavel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default user id for new chats
    pub user_id: Option<String>,
    /// Profile forwarded to agents as metadata
    pub user: UserProfile,
    /// API agent endpoint
    pub api_agent: AgentEndpoint,
    /// SQL agent endpoint
    pub sql_agent: AgentEndpoint,
    /// Fallback classifier settings
    pub fallback: FallbackSettings,
}

/// Where and how to reach one agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentEndpoint {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Extra headers sent with each request
    pub headers: HashMap<String, String>,
}

/// Who is chatting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// Fallback classifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackSettings {
    /// Phrases added to the built-in indicator table
    pub extra_indicators: Vec<String>,
}

impl AgentEndpoint {
    /// Build the HTTP adapter for this endpoint. `override_url` wins over the file.
    pub fn build(
        &self,
        kind: AgentKind,
        override_url: Option<String>,
    ) -> Result<HttpAgent, gavel_ai::Error> {
        let url = override_url
            .or_else(|| std::env::var(endpoint_env_var(kind)).ok())
            .or_else(|| self.url.clone())
            .ok_or_else(|| {
                gavel_ai::Error::InvalidConfig(format!(
                    "no URL configured for the {} agent (set {} or [{}_agent].url)",
                    kind,
                    endpoint_env_var(kind),
                    kind
                ))
            })?;

        let mut agent = HttpAgent::new(kind, url).with_headers(self.headers.clone());
        if let Some(secs) = self.timeout_secs {
            agent = agent.with_timeout(Duration::from_secs(secs));
        }
        Ok(agent)
    }
}

impl UserProfile {
    /// Replace fields with any values given on the command line
    pub fn with_overrides(
        self,
        email: Option<String>,
        username: Option<String>,
        first_name: Option<String>,
    ) -> Self {
        Self {
            email: email.or(self.email),
            username: username.or(self.username),
            first_name: first_name.or(self.first_name),
        }
    }

    /// Chat request for `user_id` carrying this profile
    pub fn new_chat(&self, user_id: impl Into<String>) -> NewChat {
        NewChat {
            user_id: user_id.into(),
            email: self.email.clone(),
            username: self.username.clone(),
            first_name: self.first_name.clone(),
        }
    }
}

impl FallbackSettings {
    /// Default indicator table plus any configured extras
    pub fn classifier(&self) -> FallbackClassifier {
        let mut classifier = FallbackClassifier::default();
        classifier.extend(&self.extra_indicators);
        classifier
    }
}

fn endpoint_env_var(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Api => "GAVEL_API_AGENT_URL",
        AgentKind::Sql => "GAVEL_SQL_AGENT_URL",
    }
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gavel")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("GAVEL_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`; a missing or unreadable file yields defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        Self::starter().save()?;
        Ok(path)
    }

    fn starter() -> Self {
        Config {
            user_id: Some("1".to_string()),
            user: UserProfile::default(),
            api_agent: AgentEndpoint {
                url: Some("http://localhost:8000/agents/api".to_string()),
                timeout_secs: Some(120),
                headers: HashMap::new(),
            },
            sql_agent: AgentEndpoint {
                url: Some("http://localhost:8000/agents/sql".to_string()),
                timeout_secs: Some(120),
                headers: HashMap::new(),
            },
            fallback: FallbackSettings::default(),
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# gavel configuration file
# Place at ~/.config/gavel/config.toml (Linux) or set GAVEL_CONFIG_PATH

# User id attached to new chats
user_id = "1"

# Profile sent to the agents with every request (all optional).
# --email, --username and --first-name override these.
[user]
# email = "bidder@example.com"
# username = "bidder"
# first_name = "Ana"

# Agent that performs operations against the auction service.
# GAVEL_API_AGENT_URL overrides the url.
[api_agent]
url = "http://localhost:8000/agents/api"
timeout_secs = 120

# Agent that answers analytical questions from the databases.
# GAVEL_SQL_AGENT_URL overrides the url.
[sql_agent]
url = "http://localhost:8000/agents/sql"
timeout_secs = 120

# [sql_agent.headers]
# x-tenant = "cash"

# Phrases that, when found in the API agent's answer, hand the request
# to the SQL agent. These are added to the built-in table.
[fallback]
extra_indicators = []
"#
}
