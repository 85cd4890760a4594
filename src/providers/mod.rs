/*!
 * Provider implementations for the text-generation service.
 *
 * This module contains client implementations for various LLM providers:
 * - OpenAI: chat completions with JSON output mode
 * - Anthropic: messages API
 * - Ollama: local LLM server
 * - Mock: scripted provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{EnhancementConfig, EnhancementProvider};
use crate::errors::ProviderError;

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;

/// A provider-neutral completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model name
    pub model: String,
    /// Optional system prompt
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Ask the provider for a bare JSON object when it supports it
    pub json_output: bool,
}

impl CompletionRequest {
    /// Create a new request with default sampling settings
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            temperature: 0.0,
            max_tokens: 4096,
            json_output: false,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Request JSON output
    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// A provider-neutral completion response
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,
    /// Prompt tokens, when reported
    pub prompt_tokens: Option<u64>,
    /// Completion tokens, when reported
    pub completion_tokens: Option<u64>,
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the enhancement client and the agent.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request using this provider
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self, model: &str) -> Result<(), ProviderError> {
        let request = CompletionRequest::new(model, "Hello").max_tokens(10);
        self.complete(request).await.map(|_| ())
    }

    /// Short provider name used in logs
    fn name(&self) -> &str;
}

/// Build the provider selected in the configuration
pub fn create_provider(config: &EnhancementConfig) -> Arc<dyn Provider> {
    let endpoint = config.get_endpoint();
    let timeout_secs = config.get_timeout_secs();

    match config.provider {
        EnhancementProvider::OpenAI => Arc::new(openai::OpenAI::new(
            config.get_api_key(),
            endpoint,
            timeout_secs,
        )),
        EnhancementProvider::Anthropic => Arc::new(anthropic::Anthropic::new(
            config.get_api_key(),
            endpoint,
            timeout_secs,
        )),
        EnhancementProvider::Ollama => Arc::new(ollama::Ollama::new(endpoint, timeout_secs)),
    }
}

/// Map a reqwest send failure onto a provider error
pub(crate) fn map_send_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(format!("{}: {}", provider, error))
    } else {
        ProviderError::RequestFailed(format!("{}: {}", provider, error))
    }
}

/// Map a non-success HTTP status onto a provider error
pub(crate) fn map_status_error(status: reqwest::StatusCode, message: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(message),
        429 => ProviderError::RateLimitExceeded(message),
        code => ProviderError::ApiError {
            status_code: code,
            message,
        },
    }
}
