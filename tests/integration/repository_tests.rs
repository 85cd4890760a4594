/*!
 * Tests for import and enhancement commits against SQLite
 */

use std::sync::Arc;

use subvocab::database::Repository;
use subvocab::enhancement::{BatchOrchestrator, ResultReconciler};
use subvocab::providers::mock::MockProvider;

use crate::common;

async fn run_echo(repository: &Repository, subtitle_id: i64, batch_size: usize) -> usize {
    BatchOrchestrator::new(
        Arc::new(repository.clone()),
        common::client(Arc::new(MockProvider::echo())),
        ResultReconciler::new("ko", "mock"),
    )
    .enhance(subtitle_id, batch_size)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_storeImport_shouldRegisterValidAndSkippedWords() {
    let (repository, subtitle_id) = common::seeded_repository().await.unwrap();

    let words = repository.get_words(subtitle_id).await.unwrap();
    assert_eq!(words.len(), 6);

    let skipped: Vec<_> = words.iter().filter(|w| !w.is_valid).collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].base_form, "3");
    assert_eq!(skipped[0].skip_reason.as_deref(), Some("ALL_SYMBOLS_OR_NUM"));

    let metadata = repository.get_word_metadata(words[0].id).await.unwrap().unwrap();
    assert!(metadata.is_pending());
}

/// Candidates come back in subtitle order with their first sentence
#[tokio::test]
async fn test_fetchPendingCandidates_shouldFollowSentenceOrder() {
    let (repository, subtitle_id) = common::seeded_repository().await.unwrap();

    let rows = repository.fetch_pending_candidates(subtitle_id).await.unwrap();

    let bases: Vec<&str> = rows.iter().map(|r| r.word.base_form.as_str()).collect();
    assert_eq!(bases, vec!["猫", "犬", "魚", "鳥", "馬"]);
    assert_eq!(rows[0].sentence_text, "猫と犬と魚");
    assert_eq!(rows[3].sentence_text, "鳥と馬が3匹");
}

#[tokio::test]
async fn test_enhance_withEchoProvider_shouldPersistEverything() {
    let (repository, subtitle_id) = common::seeded_repository().await.unwrap();

    let enhanced = run_echo(&repository, subtitle_id, 3).await;
    assert_eq!(enhanced, 5);

    let sentences = repository.get_sentences(subtitle_id).await.unwrap();
    let translations = repository.get_sentence_translations(sentences[0].id).await.unwrap();
    assert_eq!(translations.len(), 1);
    assert_eq!(translations[0].translated_text, "[ko] 猫と犬と魚");

    let words = repository.get_words(subtitle_id).await.unwrap();
    let metadata = repository.get_word_metadata(words[0].id).await.unwrap().unwrap();
    assert_eq!(metadata.jlpt_level.as_deref(), Some("N3"));

    let content = repository.get_learning_content(words[0].id).await.unwrap().unwrap();
    assert_eq!(content.meaning, "meaning of 猫");
    assert_eq!(content.model_name, "mock");

    let example = repository
        .get_example(content.example_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(example.sentence_text.starts_with("例文"));
    assert_eq!(example.translations[0].0, "ko");

    assert!(repository.fetch_pending_candidates(subtitle_id).await.unwrap().is_empty());
}

/// Enhanced words are not picked up again, so no duplicate examples appear
#[tokio::test]
async fn test_enhance_twice_shouldNotDuplicateRows() {
    let (repository, subtitle_id) = common::seeded_repository().await.unwrap();

    run_echo(&repository, subtitle_id, 1).await;
    let examples_after_first = repository.count_examples().await.unwrap();

    let second = run_echo(&repository, subtitle_id, 1).await;

    assert_eq!(second, 0);
    assert_eq!(repository.count_examples().await.unwrap(), examples_after_first);
    let stats = repository.connection().stats().unwrap();
    assert_eq!(stats.learning_content_count, 5);
    assert_eq!(stats.pending_word_count, 0);
}

/// A rejected reply leaves every word pending for the next run
#[tokio::test]
async fn test_enhance_withFailingProvider_shouldLeaveWordsPending() {
    let (repository, subtitle_id) = common::seeded_repository().await.unwrap();

    let enhanced = BatchOrchestrator::new(
        Arc::new(repository.clone()),
        common::client(Arc::new(MockProvider::failing())),
        ResultReconciler::new("ko", "mock"),
    )
    .enhance(subtitle_id, 3)
    .await
    .unwrap();

    assert_eq!(enhanced, 0);
    assert_eq!(repository.fetch_pending_candidates(subtitle_id).await.unwrap().len(), 5);
    assert_eq!(repository.count_examples().await.unwrap(), 0);
}

#[tokio::test]
async fn test_listSentences_shouldReturnStoredOrder() {
    let (repository, subtitle_id) = common::seeded_repository().await.unwrap();

    let sentences = repository.list_sentences(subtitle_id).await.unwrap();

    let texts: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["猫と犬と魚", "鳥と馬が3匹"]);
}
