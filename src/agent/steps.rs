/*!
 * Model-backed implementations of the agent steps.
 */

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::sync::Arc;

use super::state::WordEntryDraft;
use crate::enhancement::{prompts, schema};
use crate::errors::{GenerationError, SchemaViolation};
use crate::providers::{CompletionRequest, Provider};

/// Number of words the extraction step asks for
pub const DEFAULT_WORD_COUNT: usize = 5;

/// The two model calls the pipeline depends on
#[async_trait]
pub trait AgentSteps: Send + Sync {
    /// Pick the words worth studying from a subtitle
    async fn extract(&self, subtitle_raw: &str) -> Result<Vec<String>, GenerationError>;

    /// Write a card for each selected word
    async fn generate(
        &self,
        subtitle_raw: &str,
        words: &[String],
    ) -> Result<Vec<WordEntryDraft>, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct GeneratedEntries {
    #[serde(default)]
    entries: Vec<WordEntryDraft>,
}

/// Split a comma separated word list, dropping blanks and repeats
pub fn parse_word_list(text: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in text
        .split([',', '、', '，', '\n'])
        .map(str::trim)
        .filter(|w| !w.is_empty())
    {
        if !words.iter().any(|w| w == word) {
            words.push(word.to_string());
        }
    }
    words
}

/// Parse the generation step's JSON body
pub fn parse_entries(text: &str) -> Result<Vec<WordEntryDraft>, SchemaViolation> {
    let json = schema::extract_json(text)?;
    serde_json::from_str::<GeneratedEntries>(json)
        .map(|parsed| parsed.entries)
        .map_err(|e| SchemaViolation::InvalidJson(e.to_string()))
}

/// Agent steps that call a text-generation provider
#[derive(Debug, Clone)]
pub struct LlmAgentSteps {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    word_count: usize,
}

impl LlmAgentSteps {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: 2048,
            word_count: DEFAULT_WORD_COUNT,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = word_count.max(1);
        self
    }
}

#[async_trait]
impl AgentSteps for LlmAgentSteps {
    async fn extract(&self, subtitle_raw: &str) -> Result<Vec<String>, GenerationError> {
        let request = CompletionRequest::new(&self.model, prompts::extract_prompt(subtitle_raw, self.word_count))
            .system(prompts::EXTRACT_SYSTEM)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        let words = parse_word_list(&response.text);
        debug!("Extracted words: {:?}", words);
        Ok(words)
    }

    async fn generate(
        &self,
        subtitle_raw: &str,
        words: &[String],
    ) -> Result<Vec<WordEntryDraft>, GenerationError> {
        let request = CompletionRequest::new(&self.model, prompts::generate_prompt(subtitle_raw, words))
            .system(prompts::GENERATE_SYSTEM)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .json();

        let response = self.provider.complete(request).await?;
        Ok(parse_entries(&response.text)?)
    }
}
