//! Configuration types for the study-forge server and workflow.
//!
//! All process-wide settings live in [`ServerConfig`], built via its
//! [`ServerConfigBuilder`]. It is loaded once at startup and shared read-only
//! across requests; per-request knobs live in [`crate::options::WorkflowOptions`]
//! instead.
//!
//! Credentials are optional here on purpose: a server without a
//! `GITHUB_TOKEN` still starts, reports `integrations.github == false` from
//! `get_server_status`, and fails only the publish calls.

use crate::error::StudyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name reported by `/health` and `get_server_status`.
pub const SERVER_NAME: &str = "Study Forge RPC";

/// Crate version, reported alongside [`SERVER_NAME`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for a study-forge server or one-shot workflow.
///
/// # Example
/// ```rust
/// use study_forge::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .port(8080)
///     .model("gpt-4.1-mini")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Clone)]
pub struct ServerConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: String,

    /// TCP port to bind. Default: 5000. `0` picks an ephemeral port.
    pub port: u16,

    /// Completion model identifier. Default: `gpt-3.5-turbo`.
    pub model: String,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Completion-service API key, read once at startup.
    ///
    /// Only its presence matters to this crate: the provider factory reads
    /// the key from the environment itself.
    pub openai_api_key: Option<String>,

    /// Hosting-service bearer token. Publishing fails without it.
    pub github_token: Option<String>,

    /// Base URL of the hosting REST API. Default: `https://api.github.com`.
    pub github_api_base: String,

    /// Per-completion-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Per-hosting-call timeout in seconds. Default: 30.
    pub hosting_timeout_secs: u64,

    /// Prompt construction and sampling parameters.
    pub generation: GenerationSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model: "gpt-3.5-turbo".to_string(),
            provider_name: None,
            openai_api_key: None,
            github_token: None,
            github_api_base: "https://api.github.com".to_string(),
            api_timeout_secs: 60,
            hosting_timeout_secs: 30,
            generation: GenerationSettings::default(),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("github_api_base", &self.github_api_base)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("hosting_timeout_secs", &self.hosting_timeout_secs)
            .field("generation", &self.generation)
            .finish()
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether a completion-service key was configured.
    pub fn has_openai_key(&self) -> bool {
        self.openai_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Whether a hosting-service token was configured.
    pub fn has_github_token(&self) -> bool {
        self.github_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn openai_api_key(mut self, key: Option<String>) -> Self {
        self.config.openai_api_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn github_token(mut self, token: Option<String>) -> Self {
        self.config.github_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn github_api_base(mut self, url: impl Into<String>) -> Self {
        self.config.github_api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn hosting_timeout_secs(mut self, secs: u64) -> Self {
        self.config.hosting_timeout_secs = secs;
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.generation.max_input_chars = n;
        self
    }

    pub fn generation(mut self, settings: GenerationSettings) -> Self {
        self.config.generation = settings;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, StudyError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(StudyError::InvalidConfig("model must not be empty".into()));
        }
        if c.api_timeout_secs == 0 || c.hosting_timeout_secs == 0 {
            return Err(StudyError::InvalidConfig(
                "timeouts must be ≥ 1 second".into(),
            ));
        }
        if !c.github_api_base.starts_with("http://") && !c.github_api_base.starts_with("https://")
        {
            return Err(StudyError::InvalidConfig(format!(
                "github_api_base must be an HTTP(S) URL, got '{}'",
                c.github_api_base
            )));
        }
        if c.generation.max_input_chars < 100 {
            return Err(StudyError::InvalidConfig(format!(
                "max_input_chars must be ≥ 100, got {}",
                c.generation.max_input_chars
            )));
        }
        Ok(self.config)
    }
}

// ── Generation parameters ────────────────────────────────────────────────

/// Sampling parameters for each generation task.
///
/// The completion service has a bounded context, so every task sees at most
/// `max_input_chars` characters of the document; the rest is dropped silently.
/// Summaries and notes are factual and run cold; flashcards run slightly
/// warmer to vary question phrasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Input ceiling in characters. Default: 4000.
    pub max_input_chars: usize,
    /// Default: 0.3.
    pub summary_temperature: f32,
    /// Default: 0.4.
    pub flashcard_temperature: f32,
    /// Default: 400.
    pub flashcard_max_tokens: usize,
    /// Default: 0.3.
    pub notes_temperature: f32,
    /// Default: 500.
    pub notes_max_tokens: usize,
    /// Default: 0.7.
    pub chat_temperature: f32,
    /// Default: 1024.
    pub chat_max_tokens: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_input_chars: 4000,
            summary_temperature: 0.3,
            flashcard_temperature: 0.4,
            flashcard_max_tokens: 400,
            notes_temperature: 0.3,
            notes_max_tokens: 500,
            chat_temperature: 0.7,
            chat_max_tokens: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ServerConfig::default();
        assert_eq!(c.port, 5000);
        assert_eq!(c.generation.max_input_chars, 4000);
        assert!(c.generation.summary_temperature < c.generation.flashcard_temperature);
        assert!(!c.has_github_token());
    }

    #[test]
    fn empty_credentials_are_treated_as_absent() {
        let c = ServerConfig::builder()
            .github_token(Some(String::new()))
            .openai_api_key(Some("sk-test".into()))
            .build()
            .unwrap();
        assert!(!c.has_github_token());
        assert!(c.has_openai_key());
    }

    #[test]
    fn debug_redacts_secrets() {
        let c = ServerConfig::builder()
            .github_token(Some("ghp_secret".into()))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("ghp_secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn trailing_slash_stripped_from_api_base() {
        let c = ServerConfig::builder()
            .github_api_base("http://127.0.0.1:9000/")
            .build()
            .unwrap();
        assert_eq!(c.github_api_base, "http://127.0.0.1:9000");
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = ServerConfig::builder().api_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, StudyError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_tiny_input_ceiling() {
        assert!(ServerConfig::builder().max_input_chars(10).build().is_err());
    }
}
