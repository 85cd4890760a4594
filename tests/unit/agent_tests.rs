/*!
 * Tests for the retry/validation state machine
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use subvocab::agent::{AgentSteps, LlmAgentSteps, Node, RetryValidationStateMachine, WordEntryDraft};
use subvocab::errors::{AgentError, GenerationError, ProviderError, ValidationError};
use subvocab::providers::mock::MockProvider;

/// Steps that return canned results and count generate calls
struct CountingSteps {
    words: Vec<String>,
    entries: Vec<WordEntryDraft>,
    succeed_on: Option<u32>,
    fail_extract: bool,
    generate_calls: Arc<AtomicU32>,
}

impl CountingSteps {
    fn new(entries: Vec<WordEntryDraft>) -> Self {
        Self {
            words: vec!["猫".to_string()],
            entries,
            succeed_on: None,
            fail_extract: false,
            generate_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Return empty entries until the given call number
    fn succeeding_on(mut self, call: u32) -> Self {
        self.succeed_on = Some(call);
        self
    }
}

#[async_trait]
impl AgentSteps for CountingSteps {
    async fn extract(&self, _subtitle_raw: &str) -> Result<Vec<String>, GenerationError> {
        if self.fail_extract {
            return Err(GenerationError::Provider(ProviderError::ConnectionError(
                "refused".to_string(),
            )));
        }
        Ok(self.words.clone())
    }

    async fn generate(
        &self,
        _subtitle_raw: &str,
        _words: &[String],
    ) -> Result<Vec<WordEntryDraft>, GenerationError> {
        let call = self.generate_calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.succeed_on {
            Some(target) if call < target => Ok(Vec::new()),
            _ => Ok(self.entries.clone()),
        }
    }
}

fn card() -> WordEntryDraft {
    WordEntryDraft::new("猫", "cat", "猫が好きです。")
}

#[tokio::test]
async fn test_run_withValidEntries_shouldGenerateOnce() {
    let steps = CountingSteps::new(vec![card()]);
    let calls = steps.generate_calls.clone();

    let state = RetryValidationStateMachine::new(steps).run("猫が好き").await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(state.retry_count, 0);
    assert_eq!(state.word_entries, vec![card()]);
    assert_eq!(
        state.visited,
        vec![Node::Extract, Node::Generate, Node::Validate, Node::End]
    );
}

/// Three failed validations end the run after exactly three generations
#[tokio::test]
async fn test_run_withAlwaysInvalidEntries_shouldStopAfterThreeGenerations() {
    let mut incomplete = card();
    incomplete.example = None;
    let steps = CountingSteps::new(vec![incomplete]);
    let calls = steps.generate_calls.clone();

    let result = RetryValidationStateMachine::new(steps).run("猫").await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match result {
        Err(AgentError::RetriesExhausted { retries, last_error }) => {
            assert_eq!(retries, 3);
            assert_eq!(
                last_error,
                ValidationError::MissingField {
                    index: 0,
                    field: "example"
                }
            );
        }
        other => panic!("expected exhausted retries, got {:?}", other),
    }
}

#[tokio::test]
async fn test_run_withRecoveryOnSecondAttempt_shouldSucceed() {
    let steps = CountingSteps::new(vec![card()]).succeeding_on(2);
    let calls = steps.generate_calls.clone();

    let state = RetryValidationStateMachine::new(steps).run("猫").await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(state.retry_count, 1);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_run_withCustomRetryBudget_shouldHonourIt() {
    let steps = CountingSteps::new(Vec::new());
    let calls = steps.generate_calls.clone();

    let result = RetryValidationStateMachine::new(steps)
        .with_max_retries(5)
        .run("猫")
        .await;

    assert!(matches!(result, Err(AgentError::RetriesExhausted { retries: 5, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_run_withExtractFailure_shouldNotGenerate() {
    let mut steps = CountingSteps::new(vec![card()]);
    steps.fail_extract = true;
    let calls = steps.generate_calls.clone();

    let result = RetryValidationStateMachine::new(steps).run("猫").await;

    assert!(matches!(result, Err(AgentError::Extract(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Provider faults during generation count as failed validations
#[tokio::test]
async fn test_run_withLlmSteps_andFailingProvider_shouldExhaustRetries() {
    let provider = Arc::new(MockProvider::scripted(vec![
        "猫".to_string(),
        "not json".to_string(),
    ]));
    let steps = LlmAgentSteps::new(provider.clone(), "mock");

    let result = RetryValidationStateMachine::new(steps).run("猫").await;

    match result {
        Err(AgentError::RetriesExhausted { last_error, .. }) => {
            assert!(matches!(last_error, ValidationError::NoEntries { .. }));
        }
        other => panic!("expected exhausted retries, got {:?}", other),
    }
    assert_eq!(provider.request_count(), 4);
}

#[tokio::test]
async fn test_run_withLlmSteps_andValidCards_shouldReturnEntries() {
    let provider = Arc::new(MockProvider::scripted(vec![
        "猫, 犬".to_string(),
        r#"{"entries":[{"word":"猫","meaning":"cat","example":"猫がいる"},{"word":"犬","meaning":"dog","example":"犬がいる"}]}"#.to_string(),
    ]));
    let steps = LlmAgentSteps::new(provider, "mock");

    let state = RetryValidationStateMachine::new(steps).run("猫と犬").await.unwrap();

    assert_eq!(state.selected_words, vec!["猫".to_string(), "犬".to_string()]);
    assert_eq!(state.word_entries.len(), 2);
}
