/*!
 * Tests for concurrent batch enhancement
 */

use std::collections::HashSet;
use std::sync::Arc;

use subvocab::enhancement::{BatchOrchestrator, ResultReconciler, UnitOfWork};
use subvocab::errors::EnhanceError;
use subvocab::providers::mock::MockProvider;

use crate::common::{self, RecordingStore};

fn orchestrator(store: Arc<RecordingStore>, provider: Arc<MockProvider>) -> BatchOrchestrator {
    BatchOrchestrator::new(
        store,
        common::client(provider),
        ResultReconciler::new("ko", "mock"),
    )
}

/// No pending words means no provider calls and no commit
#[tokio::test]
async fn test_enhance_withNoCandidates_shouldReturnZeroWithoutCalls() {
    common::init_logging();
    let store = Arc::new(RecordingStore::with_rows(Vec::new()));
    let provider = Arc::new(MockProvider::echo());

    let enhanced = orchestrator(store.clone(), provider.clone()).enhance(1, 3).await.unwrap();

    assert_eq!(enhanced, 0);
    assert_eq!(provider.request_count(), 0);
    assert!(store.commits().is_empty());
}

#[tokio::test]
async fn test_enhance_withEchoProvider_shouldEnhanceEveryWordInOneCommit() {
    let store = Arc::new(RecordingStore::with_rows(common::generated_rows(10, 2)));
    let provider = Arc::new(MockProvider::echo());

    let report = orchestrator(store.clone(), provider.clone())
        .enhance_with_report(1, 3)
        .await
        .unwrap();

    assert_eq!(report.success_count, 20);
    assert_eq!(report.total_batches, 4);
    assert!(report.failures.is_empty());
    assert_eq!(provider.request_count(), 4);

    let commits = store.commits();
    assert_eq!(commits.len(), 1);
    let committed = report.committed.unwrap();
    assert_eq!(committed.translations_upserted, 10);
    assert_eq!(committed.learning_contents_written, 20);
}

/// Every committed id comes from the fetched candidates
#[tokio::test]
async fn test_enhance_shouldOnlyWriteFetchedIds() {
    let rows = common::generated_rows(6, 3);
    let word_ids: HashSet<i64> = rows.iter().map(|r| r.word.id).collect();
    let sentence_ids: HashSet<i64> = rows.iter().map(|r| r.word.sentence_id).collect();
    let store = Arc::new(RecordingStore::with_rows(rows));

    orchestrator(store.clone(), Arc::new(MockProvider::echo()))
        .enhance(1, 2)
        .await
        .unwrap();

    let work = &store.commits()[0];
    assert!(work.translations().iter().all(|t| sentence_ids.contains(&t.sentence_id)));
    assert!(work.metadata().iter().all(|m| word_ids.contains(&m.word_id)));
    assert!(work
        .learning_contents()
        .iter()
        .all(|c| c.example.0 < work.examples().len()));
}

/// At most the configured number of generation calls run at once
#[tokio::test]
async fn test_enhance_withManyBatches_shouldBoundConcurrency() {
    let store = Arc::new(RecordingStore::with_rows(common::generated_rows(24, 1)));
    let provider = Arc::new(MockProvider::slow(50));

    let report = orchestrator(store, provider.clone())
        .with_max_concurrent_requests(3)
        .enhance_with_report(1, 1)
        .await
        .unwrap();

    assert_eq!(report.total_batches, 24);
    assert_eq!(report.success_count, 24);
    assert!(provider.peak_in_flight() <= 3);
    assert!(provider.peak_in_flight() >= 2);
}

/// Failed batches are reported; the rest still commit
#[tokio::test]
async fn test_enhance_withIntermittentFailures_shouldKeepGoodBatches() {
    let store = Arc::new(RecordingStore::with_rows(common::generated_rows(6, 1)));
    let provider = Arc::new(MockProvider::intermittent(3));

    let report = orchestrator(store.clone(), provider)
        .with_max_concurrent_requests(1)
        .enhance_with_report(1, 1)
        .await
        .unwrap();

    assert_eq!(report.total_batches, 6);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.success_count, 4);
    assert!(report.failures.windows(2).all(|w| w[0].batch_number < w[1].batch_number));
    assert_eq!(store.commits().len(), 1);
}

#[tokio::test]
async fn test_enhance_withFailingProvider_shouldReturnZeroAndCommitNothing() {
    let store = Arc::new(RecordingStore::with_rows(common::abcde_rows()));

    let report = orchestrator(store.clone(), Arc::new(MockProvider::failing()))
        .enhance_with_report(1, 1)
        .await
        .unwrap();

    assert_eq!(report.success_count, 0);
    assert!(report.all_failed());
    assert_eq!(report.failures[0].sentence_ids, vec![10]);
    assert!(report.committed.is_none());
    assert!(store.commits().is_empty());
}

#[tokio::test]
async fn test_enhance_withMalformedReplies_shouldTreatBatchAsFailed() {
    let store = Arc::new(RecordingStore::with_rows(common::abcde_rows()));
    let provider = Arc::new(MockProvider::scripted(vec!["```json\n{\"trans\": []}\n```".to_string()]));

    let report = orchestrator(store.clone(), provider)
        .enhance_with_report(1, 3)
        .await
        .unwrap();

    assert_eq!(report.success_count, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.starts_with("Malformed response"));
}

#[tokio::test]
async fn test_enhance_withFetchFailure_shouldReturnFetchError() {
    let store = Arc::new(RecordingStore::failing_fetch());
    let provider = Arc::new(MockProvider::echo());

    let result = orchestrator(store, provider.clone()).enhance(3, 3).await;

    assert!(matches!(result, Err(EnhanceError::Fetch(_))));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_enhance_withCommitFailure_shouldReturnCommitError() {
    let store = Arc::new(RecordingStore::failing_commit(common::abcde_rows()));

    let result = orchestrator(store, Arc::new(MockProvider::echo())).enhance(1, 3).await;

    assert!(matches!(result, Err(EnhanceError::Commit(_))));
}

#[tokio::test]
async fn test_enhance_withZeroBatchSize_shouldBeRejected() {
    let store = Arc::new(RecordingStore::with_rows(common::abcde_rows()));

    let result = orchestrator(store, Arc::new(MockProvider::echo())).enhance(1, 0).await;

    assert!(matches!(result, Err(EnhanceError::InvalidBatchSize(0))));
}

/// The caller owns the unit of work and decides when to commit
#[tokio::test]
async fn test_enhanceInto_shouldFillWorkWithoutCommitting() {
    let store = Arc::new(RecordingStore::with_rows(common::abcde_rows()));
    let mut work = UnitOfWork::new();

    let report = orchestrator(store.clone(), Arc::new(MockProvider::echo()))
        .enhance_into(1, 3, &mut work)
        .await
        .unwrap();

    assert_eq!(report.success_count, 5);
    assert_eq!(work.examples().len(), 2);
    assert!(store.commits().is_empty());
}
