//! The completion-service seam.
//!
//! Everything the crate asks of a language model goes through
//! [`CompletionService`]: a list of role-tagged messages plus sampling
//! parameters in, generated text out. The production implementation,
//! [`LlmCompletion`], wraps an `edgequake_llm` provider so any backend the
//! provider factory knows (OpenAI, Anthropic, Gemini, Ollama, …) works
//! unchanged. Tests plug in a canned implementation instead.
//!
//! A call is attempted once. Timeouts and provider errors surface as
//! [`StudyError::GenerationFailed`] for the caller to report.

use crate::config::ServerConfig;
use crate::error::StudyError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Speaker of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat-style completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// Generated text plus token accounting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// "Given a prompt and parameters, return generated text."
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Model identifier requests are served by.
    fn model(&self) -> &str;

    /// Run one completion. Implementations must not retry.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, StudyError>;
}

/// [`CompletionService`] backed by an `edgequake_llm` provider.
pub struct LlmCompletion {
    provider: Arc<dyn LLMProvider>,
    model: String,
    timeout: Duration,
}

impl LlmCompletion {
    /// Wrap an already-constructed provider.
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            model: model.into(),
            timeout,
        }
    }

    /// Resolve a provider from the server configuration and the environment.
    ///
    /// Resolution order:
    ///
    /// 1. **Named provider** (`config.provider_name`), with `config.model`.
    /// 2. **OpenAI** when `OPENAI_API_KEY` is set, with `config.model`.
    /// 3. **Auto-detection** via [`ProviderFactory::from_env`], which picks
    ///    the first provider whose key is present.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StudyError> {
        let timeout = Duration::from_secs(config.api_timeout_secs);

        if let Some(ref name) = config.provider_name {
            let provider = create_provider(name, &config.model)?;
            return Ok(Self::new(provider, &config.model, timeout));
        }

        if config.has_openai_key() {
            let provider = create_provider("openai", &config.model)?;
            return Ok(Self::new(provider, &config.model, timeout));
        }

        let (provider, _embedding) =
            ProviderFactory::from_env().map_err(|e| StudyError::ProviderNotConfigured {
                provider: "auto".to_string(),
                hint: format!(
                    "No LLM provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                    Error: {}",
                    e
                ),
            })?;
        Ok(Self::new(provider, &config.model, timeout))
    }
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, StudyError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        StudyError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn to_chat_message(message: &PromptMessage) -> ChatMessage {
    match message.role {
        Role::System => ChatMessage::system(message.content.as_str()),
        Role::User => ChatMessage::user(message.content.as_str()),
        Role::Assistant => ChatMessage::assistant(message.content.as_str()),
    }
}

fn build_options(request: &CompletionRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

#[async_trait]
impl CompletionService for LlmCompletion {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, StudyError> {
        let start = Instant::now();
        let messages: Vec<ChatMessage> = request.messages.iter().map(to_chat_message).collect();
        let options = build_options(request);

        let response = tokio::time::timeout(self.timeout, self.provider.chat(&messages, Some(&options)))
            .await
            .map_err(|_| StudyError::GenerationFailed {
                task: "completion",
                detail: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| StudyError::GenerationFailed {
                task: "completion",
                detail: format!("{}", e),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.model,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(Completion {
            text: response.content,
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
        })
    }
}

/// Stand-in used when no provider could be resolved at startup.
///
/// The server still starts and reports `integrations.openai == false`; every
/// completion call fails with the resolution error instead.
pub struct UnavailableCompletion {
    model: String,
    reason: String,
}

impl UnavailableCompletion {
    pub fn new(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CompletionService for UnavailableCompletion {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, StudyError> {
        Err(StudyError::GenerationFailed {
            task: "completion",
            detail: self.reason.clone(),
        })
    }
}
