use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::agent::{AgentState, LlmAgentSteps, RetryValidationStateMachine};
use crate::app_config::Config;
use crate::database::models::SubtitleStatus;
use crate::database::{DatabaseConnection, DatabaseStats, ImportSummary, Repository};
use crate::enhancement::{
    BatchOrchestrator, ClientSettings, EnhancementClient, EnhancementReport, ResultReconciler,
};
use crate::errors::{AppError, ProviderError};
use crate::ingest::{self, SubtitleDocument};
use crate::providers::{self, Provider};

// @module: Application controller wiring configuration, storage and providers

/// Main application controller for the vocabulary pipeline
pub struct Controller {
    // @field: App configuration
    config: Config,
    repository: Repository,
    provider: Arc<dyn Provider>,
}

impl Controller {
    /// Create a controller backed by an in-memory database and the given provider
    pub fn new_for_test(provider: Arc<dyn Provider>) -> Result<Self> {
        let repository = Repository::new_in_memory()?;
        Ok(Self::with_parts(Config::default(), repository, provider))
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let db = match &config.database_path {
            Some(path) => DatabaseConnection::new(path)
                .with_context(|| format!("Failed to open database at {}", path.display()))?,
            None => DatabaseConnection::new_default()?,
        };
        let provider = providers::create_provider(&config.enhancement);
        Ok(Self::with_parts(config, Repository::new(db), provider))
    }

    /// Assemble a controller from already built parts
    pub fn with_parts(config: Config, repository: Repository, provider: Arc<dyn Provider>) -> Self {
        Self {
            config,
            repository,
            provider,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Import a tokenized subtitle document from disk
    pub async fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportSummary> {
        let path = path.as_ref();
        let document = ingest::load_document(path)?;
        info!("Importing {} ({} sentences)", path.display(), document.sentences.len());
        self.import_document(&document).await
    }

    /// Import an already loaded document
    pub async fn import_document(&self, document: &SubtitleDocument) -> Result<ImportSummary> {
        let plan = ingest::plan_import(document)?;
        let summary = self.repository.store_import(plan).await?;
        info!(
            "Imported subtitle {}: {} sentences, {} words ({} eligible)",
            summary.subtitle_id, summary.sentence_count, summary.word_count, summary.valid_word_count
        );
        Ok(summary)
    }

    /// Enhance the pending words of a subtitle and record the subtitle's status
    pub async fn enhance(&self, subtitle_id: i64, batch_size: Option<usize>) -> Result<EnhancementReport, AppError> {
        let common = &self.config.enhancement.common;
        let batch_size = batch_size.unwrap_or(common.batch_size);

        let settings = ClientSettings::from_config(&self.config);
        let reconciler = ResultReconciler::new(&self.config.target_language, &settings.model);
        let client = EnhancementClient::new(Arc::clone(&self.provider), settings);
        let orchestrator = BatchOrchestrator::new(Arc::new(self.repository.clone()), client, reconciler)
            .with_max_concurrent_requests(common.max_concurrent_requests);

        let report = orchestrator.enhance_with_report(subtitle_id, batch_size).await?;

        let status = if report.all_failed() {
            SubtitleStatus::Failed
        } else if report.failures.is_empty() {
            SubtitleStatus::Completed
        } else {
            SubtitleStatus::Pending
        };
        self.repository.set_subtitle_status(subtitle_id, status).await?;

        if report.is_noop() {
            info!("Subtitle {} has no pending words", subtitle_id);
        } else if !report.failures.is_empty() {
            warn!(
                "{} of {} batches failed for subtitle {}",
                report.failures.len(),
                report.total_batches,
                subtitle_id
            );
        }

        Ok(report)
    }

    /// Run the single-shot generation pipeline on raw subtitle text
    pub async fn run_agent(&self, subtitle_raw: &str) -> Result<AgentState, AppError> {
        let enhancement = &self.config.enhancement;
        let steps = LlmAgentSteps::new(Arc::clone(&self.provider), enhancement.get_model())
            .with_temperature(enhancement.common.temperature);
        let machine = RetryValidationStateMachine::new(steps)
            .with_max_retries(enhancement.common.agent_max_retries);

        Ok(machine.run(subtitle_raw).await?)
    }

    /// Send a minimal request to the configured provider
    pub async fn check_provider(&self) -> Result<(), ProviderError> {
        let model = self.config.enhancement.get_model();
        info!("Testing connection to {} with model {}", self.provider.name(), model);
        self.provider.test_connection(&model).await
    }

    /// Row counts and file size of the database
    pub fn stats(&self) -> Result<DatabaseStats> {
        self.repository.connection().stats()
    }
}
