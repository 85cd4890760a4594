/*!
 * End-to-end tests through the application controller
 */

use std::sync::Arc;

use subvocab::Controller;
use subvocab::app_config::{Config, EnhancementProvider};
use subvocab::database::models::SubtitleStatus;
use subvocab::database::{DatabaseConnection, Repository};
use subvocab::errors::{AgentError, AppError};
use subvocab::providers::mock::MockProvider;
use tempfile::TempDir;

use crate::common;

fn file_backed_controller(dir: &TempDir, provider: MockProvider) -> Controller {
    let mut config = Config::default();
    config.enhancement.provider = EnhancementProvider::Ollama;
    config.database_path = Some(dir.path().join("data").join("subvocab.db"));

    let db = DatabaseConnection::new(config.database_path.as_ref().unwrap()).unwrap();
    Controller::with_parts(config, Repository::new(db), Arc::new(provider))
}

#[tokio::test]
async fn test_importThenEnhance_fromJsonFile_shouldCompleteSubtitle() {
    common::init_logging();
    let dir = TempDir::new().unwrap();
    let document_path = dir.path().join("ep01.json");
    std::fs::write(
        &document_path,
        serde_json::to_string(&common::sample_document()).unwrap(),
    )
    .unwrap();

    let controller = file_backed_controller(&dir, MockProvider::echo());

    let summary = controller.import_file(&document_path).await.unwrap();
    assert_eq!(summary.sentence_count, 2);
    assert_eq!(summary.word_count, 6);
    assert_eq!(summary.valid_word_count, 5);

    let report = controller.enhance(summary.subtitle_id, None).await.unwrap();
    assert_eq!(report.success_count, 5);

    let subtitle = controller
        .repository()
        .get_subtitle(summary.subtitle_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subtitle.status, SubtitleStatus::Completed);

    let stats = controller.stats().unwrap();
    assert_eq!(stats.subtitle_count, 1);
    assert_eq!(stats.pending_word_count, 0);
    assert!(stats.file_size_bytes > 0);
}

#[tokio::test]
async fn test_import_withMissingFile_shouldFail() {
    let dir = TempDir::new().unwrap();
    let controller = file_backed_controller(&dir, MockProvider::echo());

    assert!(controller.import_file(dir.path().join("nope.json")).await.is_err());
}

/// A second enhance on a finished subtitle is a no-op
#[tokio::test]
async fn test_enhance_afterCompletion_shouldBeNoop() {
    let provider = Arc::new(MockProvider::echo());
    let controller = Controller::new_for_test(provider.clone()).unwrap();
    let summary = controller.import_document(&common::sample_document()).await.unwrap();

    controller.enhance(summary.subtitle_id, Some(1)).await.unwrap();
    let calls_after_first = provider.request_count();

    let report = controller.enhance(summary.subtitle_id, Some(1)).await.unwrap();

    assert!(report.is_noop());
    assert_eq!(provider.request_count(), calls_after_first);
}

#[tokio::test]
async fn test_runAgent_withScriptedProvider_shouldReturnCards() {
    let provider = MockProvider::scripted(vec![
        "猫".to_string(),
        r#"{"entries":[{"word":"猫","meaning":"고양이","example":"猫が寝ている。"}]}"#.to_string(),
    ]);
    let controller = Controller::new_for_test(Arc::new(provider)).unwrap();

    let state = controller.run_agent("猫が寝ている").await.unwrap();

    assert_eq!(state.word_entries.len(), 1);
    assert_eq!(state.word_entries[0].meaning.as_deref(), Some("고양이"));
}

#[tokio::test]
async fn test_runAgent_withEmptyReplies_shouldSurfaceExhaustedRetries() {
    let controller = Controller::new_for_test(Arc::new(MockProvider::empty())).unwrap();

    let result = controller.run_agent("猫").await;

    assert!(matches!(
        result,
        Err(AppError::Agent(AgentError::RetriesExhausted { retries: 3, .. }))
    ));
}

#[tokio::test]
async fn test_checkProvider_withEchoProvider_shouldPass() {
    let provider = MockProvider::echo().with_custom_response(|_| "pong".to_string());
    let controller = Controller::new_for_test(Arc::new(provider)).unwrap();

    assert!(controller.check_provider().await.is_ok());
}
