use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// SQLite database file; the user data directory is used when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Language code translations and meanings are written in
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Enhancement (generation service) config
    #[serde(default)]
    pub enhancement: EnhancementConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Generation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementProvider {
    // @provider: OpenAI chat completions
    #[default]
    OpenAI,
    // @provider: Anthropic messages
    Anthropic,
    // @provider: Ollama (local)
    Ollama,
}

impl EnhancementProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }

    // @returns: Whether the provider is hosted and needs an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl std::fmt::Display for EnhancementProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for EnhancementProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: EnhancementProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(&provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(&provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Enhancement service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EnhancementConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: EnhancementProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Settings shared by all providers
    #[serde(default)]
    pub common: EnhancementCommonConfig,
}

/// Settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EnhancementCommonConfig {
    /// Sentences per batch (chunking is by sentence count, not word count)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum generation calls in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Validation retries allowed for the single-shot agent
    #[serde(default = "default_agent_max_retries")]
    pub agent_max_retries: u32,
}

impl Default for EnhancementCommonConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_requests: default_max_concurrent_requests(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            agent_max_retries: default_agent_max_retries(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "ko".to_string()
}

fn default_batch_size() -> usize {
    3
}

fn default_max_concurrent_requests() -> usize {
    3
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.0
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_agent_max_retries() -> u32 {
    3
}

fn default_model(provider: &EnhancementProvider) -> String {
    match provider {
        EnhancementProvider::OpenAI => "gpt-4o-mini".to_string(),
        EnhancementProvider::Anthropic => "claude-3-haiku-20240307".to_string(),
        EnhancementProvider::Ollama => "llama3.1".to_string(),
    }
}

fn default_endpoint(provider: &EnhancementProvider) -> String {
    match provider {
        EnhancementProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        EnhancementProvider::Anthropic => "https://api.anthropic.com".to_string(),
        EnhancementProvider::Ollama => "http://localhost:11434".to_string(),
    }
}

impl Config {
    /// Load the configuration at `path`, writing a default one first if the file is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language must not be empty"));
        }

        let common = &self.enhancement.common;
        if common.batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1"));
        }
        if common.max_concurrent_requests == 0 {
            return Err(anyhow!("max_concurrent_requests must be at least 1"));
        }
        if !(0.0..=2.0).contains(&common.temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 2.0, got {}", common.temperature));
        }

        let provider = &self.enhancement.provider;
        if provider.requires_api_key() && self.enhancement.get_api_key().is_empty() {
            return Err(anyhow!(
                "API key is required for {} provider",
                provider.display_name()
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: None,
            target_language: default_target_language(),
            enhancement: EnhancementConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl EnhancementConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &EnhancementProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, inserting defaults if absent
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let index = match self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str)
        {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider.clone()));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(config) if !config.model.is_empty() => config.model.clone(),
            _ => default_model(&self.provider),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|config| config.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        match self.get_active_provider_config() {
            Some(config) if !config.endpoint.is_empty() => config.endpoint.clone(),
            _ => default_endpoint(&self.provider),
        }
    }

    /// Get the per-call timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(config) if config.timeout_secs > 0 => config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            provider: EnhancementProvider::default(),
            available_providers: vec![
                ProviderConfig::new(EnhancementProvider::OpenAI),
                ProviderConfig::new(EnhancementProvider::Anthropic),
                ProviderConfig::new(EnhancementProvider::Ollama),
            ],
            common: EnhancementCommonConfig::default(),
        }
    }
}
