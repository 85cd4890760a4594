/*!
 * Batch orchestration for vocabulary enhancement.
 *
 * A run fetches every pending word of a subtitle, splits the originating
 * sentences into batches, and generates content for each batch with a
 * bounded number of requests in flight. Batch failures are logged and
 * counted as zero; only a failed fetch or a failed commit ends the run.
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use super::client::EnhancementClient;
use super::payload::{group_by_sentence, CandidateRow, PayloadBuilder, SentenceTask};
use super::reconciler::ResultReconciler;
use super::unit_of_work::UnitOfWork;
use crate::database::models::CommitSummary;
use crate::errors::{EnhanceError, FetchError, GenerationError};

/// Default number of generation calls allowed in flight
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 3;

/// Storage seen by the orchestrator
#[async_trait]
pub trait EnhancementStore: Send + Sync {
    /// Valid words of a subtitle that are still waiting for enhancement
    async fn fetch_pending(&self, subtitle_id: i64) -> Result<Vec<CandidateRow>, FetchError>;

    /// Persist all staged writes atomically
    async fn commit(&self, work: UnitOfWork) -> anyhow::Result<CommitSummary>;
}

/// A batch that produced nothing
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    /// 1-based batch number
    pub batch_number: usize,
    pub sentence_ids: Vec<i64>,
    pub error: String,
}

/// Outcome of one enhancement run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnhancementReport {
    pub subtitle_id: i64,
    pub candidate_count: usize,
    pub total_batches: usize,
    /// Words that received learning content
    pub success_count: usize,
    pub failures: Vec<BatchFailure>,
    pub elapsed: Duration,
    /// Present once the run's writes have been committed
    pub committed: Option<CommitSummary>,
}

impl EnhancementReport {
    /// Nothing was pending
    pub fn is_noop(&self) -> bool {
        self.total_batches == 0
    }

    /// Every batch failed
    pub fn all_failed(&self) -> bool {
        self.total_batches > 0 && self.failures.len() == self.total_batches
    }
}

struct BatchOutcome {
    success_count: usize,
    work: UnitOfWork,
    elapsed: Duration,
}

/// Runs enhancement batches against a store and a generation client
pub struct BatchOrchestrator {
    store: Arc<dyn EnhancementStore>,
    client: Arc<EnhancementClient>,
    reconciler: Arc<ResultReconciler>,
    max_concurrent_requests: usize,
}

impl BatchOrchestrator {
    pub fn new(
        store: Arc<dyn EnhancementStore>,
        client: EnhancementClient,
        reconciler: ResultReconciler,
    ) -> Self {
        Self {
            store,
            client: Arc::new(client),
            reconciler: Arc::new(reconciler),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }

    /// Override the number of generation calls allowed in flight
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max.max(1);
        self
    }

    /// Enhance all pending words of a subtitle and return how many got content
    pub async fn enhance(&self, subtitle_id: i64, batch_size: usize) -> Result<usize, EnhanceError> {
        self.enhance_with_report(subtitle_id, batch_size)
            .await
            .map(|report| report.success_count)
    }

    /// Enhance all pending words and commit the accumulated writes once
    pub async fn enhance_with_report(
        &self,
        subtitle_id: i64,
        batch_size: usize,
    ) -> Result<EnhancementReport, EnhanceError> {
        let mut work = UnitOfWork::new();
        let mut report = self.enhance_into(subtitle_id, batch_size, &mut work).await?;

        if work.is_empty() {
            return Ok(report);
        }

        let summary = self.store.commit(work).await.map_err(|e| {
            error!("Commit failed for subtitle {}: {}", subtitle_id, e);
            EnhanceError::Commit(e.to_string())
        })?;
        info!("Committed {}", summary);
        report.committed = Some(summary);

        Ok(report)
    }

    /// Run all batches and merge their writes into `work` without committing
    pub async fn enhance_into(
        &self,
        subtitle_id: i64,
        batch_size: usize,
        work: &mut UnitOfWork,
    ) -> Result<EnhancementReport, EnhanceError> {
        if batch_size == 0 {
            return Err(EnhanceError::InvalidBatchSize(batch_size));
        }

        let start_time = Instant::now();
        let rows = self.store.fetch_pending(subtitle_id).await?;

        let mut report = EnhancementReport {
            subtitle_id,
            candidate_count: rows.len(),
            ..Default::default()
        };

        if rows.is_empty() {
            info!("No pending words for subtitle {}", subtitle_id);
            return Ok(report);
        }

        let batches: Vec<Vec<SentenceTask>> = group_by_sentence(&rows)
            .chunks(batch_size)
            .map(<[SentenceTask]>::to_vec)
            .collect();
        let total_batches = batches.len();
        report.total_batches = total_batches;

        info!(
            "Enhancing {} words of subtitle {} in {} batches (max {} in flight)",
            rows.len(),
            subtitle_id,
            total_batches,
            self.max_concurrent_requests
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));

        let mut results = stream::iter(batches.into_iter().enumerate())
            .map(|(batch_index, batch)| {
                let semaphore = semaphore.clone();
                let client = self.client.clone();
                let reconciler = self.reconciler.clone();

                async move {
                    let sentence_ids: Vec<i64> = batch.iter().map(|t| t.sentence.id).collect();
                    let result =
                        Self::process_batch(&semaphore, &client, &reconciler, &batch).await;
                    (batch_index, sentence_ids, result)
                }
            })
            .buffer_unordered(self.max_concurrent_requests);

        let mut completed = 0;
        while let Some((batch_index, sentence_ids, result)) = results.next().await {
            completed += 1;
            match result {
                Ok(outcome) => {
                    info!(
                        "Batch {} done in {:?}: {} words enhanced",
                        batch_index + 1,
                        outcome.elapsed,
                        outcome.success_count
                    );
                    report.success_count += outcome.success_count;
                    work.merge(outcome.work);
                }
                Err(e) => {
                    warn!("Batch {} failed: {}", batch_index + 1, e);
                    report.failures.push(BatchFailure {
                        batch_number: batch_index + 1,
                        sentence_ids,
                        error: e.to_string(),
                    });
                }
            }

            info!(
                "Enhancement progress: {:.1}% ({}/{} batches)",
                completed as f64 / total_batches as f64 * 100.0,
                completed,
                total_batches
            );
        }

        report.failures.sort_by_key(|f| f.batch_number);
        report.elapsed = start_time.elapsed();

        if report.all_failed() {
            error!("All {} batches failed for subtitle {}", total_batches, subtitle_id);
        }

        Ok(report)
    }

    async fn process_batch(
        semaphore: &Semaphore,
        client: &EnhancementClient,
        reconciler: &ResultReconciler,
        batch: &[SentenceTask],
    ) -> Result<BatchOutcome, GenerationError> {
        let start_time = Instant::now();
        let payload = PayloadBuilder::from_tasks(batch);

        let response = {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| GenerationError::Cancelled(e.to_string()))?;
            client.generate(&payload.request).await?
        };

        let mut work = UnitOfWork::new();
        let success_count = reconciler.reconcile(&payload, &response, &mut work);

        Ok(BatchOutcome {
            success_count,
            work,
            elapsed: start_time.elapsed(),
        })
    }
}
