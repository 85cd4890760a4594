/*!
 * Structured-generation client for enhancement batches.
 */

use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use super::prompts;
use super::schema::{self, AIResponse, EnhancementRequest};
use crate::app_config::Config;
use crate::errors::GenerationError;
use crate::providers::{CompletionRequest, Provider};

/// Sampling and timeout settings for the client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub model: String,
    pub target_language: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl ClientSettings {
    pub fn from_config(config: &Config) -> Self {
        let enhancement = &config.enhancement;
        Self {
            model: enhancement.get_model(),
            target_language: config.target_language.clone(),
            temperature: enhancement.common.temperature,
            max_tokens: enhancement.common.max_tokens,
            timeout: Duration::from_secs(enhancement.get_timeout_secs()),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            target_language: "ko".to_string(),
            temperature: 0.0,
            max_tokens: 4096,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Sends enhancement requests and validates the replies
#[derive(Debug, Clone)]
pub struct EnhancementClient {
    provider: Arc<dyn Provider>,
    settings: ClientSettings,
}

impl EnhancementClient {
    pub fn new(provider: Arc<dyn Provider>, settings: ClientSettings) -> Self {
        Self { provider, settings }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Run one generation round trip for a request.
    ///
    /// Entries referencing ids absent from `request` are dropped and logged.
    pub async fn generate(&self, request: &EnhancementRequest) -> Result<AIResponse, GenerationError> {
        let payload =
            serde_json::to_string(request).map_err(|e| GenerationError::Encode(e.to_string()))?;

        let completion = CompletionRequest::new(&self.settings.model, prompts::enhancement_prompt(&payload))
            .system(prompts::enhancement_system(&self.settings.target_language))
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .json();

        debug!(
            "Sending {} sentences / {} groups to {}",
            request.data.len(),
            request.groups.len(),
            self.provider.name()
        );

        let response = tokio::time::timeout(self.settings.timeout, self.provider.complete(completion))
            .await
            .map_err(|_| GenerationError::Timeout(self.settings.timeout.as_secs()))??;

        let validated = schema::validate_response(&response.text, request)?;
        for dropped in &validated.dropped {
            warn!("Dropping response entry: {}", dropped);
        }

        Ok(validated.response)
    }
}
