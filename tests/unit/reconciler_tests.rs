/*!
 * Tests for mapping validated responses onto store writes
 */

use subvocab::database::models::GradeLevel;
use subvocab::enhancement::payload::PayloadBuilder;
use subvocab::enhancement::schema::{AIResponse, GroupExample, SentenceTranslation, WordDefinition};
use subvocab::enhancement::unit_of_work::ExampleKey;
use subvocab::enhancement::{ResultReconciler, UnitOfWork};

use crate::common;

fn definition(word_ref: i64) -> WordDefinition {
    WordDefinition {
        word_ref,
        meaning: format!("meaning {}", word_ref),
        reading: "よみ".to_string(),
        level: GradeLevel::N4,
    }
}

fn example(group_ref: i64, members: Vec<i64>) -> GroupExample {
    GroupExample {
        group_ref,
        text: format!("例文{}", group_ref),
        translation: format!("예문{}", group_ref),
        member_word_refs: members,
    }
}

fn full_response() -> AIResponse {
    AIResponse {
        translations: vec![
            SentenceTranslation {
                sentence_ref: 10,
                text: "번역 1".to_string(),
            },
            SentenceTranslation {
                sentence_ref: 20,
                text: "번역 2".to_string(),
            },
        ],
        word_definitions: (1..=5).map(definition).collect(),
        examples: vec![example(1, vec![1, 4, 2]), example(2, vec![5, 3])],
    }
}

#[test]
fn test_reconcile_withFullResponse_shouldEnhanceEveryWord() {
    let payload = PayloadBuilder::build(&common::abcde_rows());
    let reconciler = ResultReconciler::new("ko", "gpt-4o-mini");
    let mut work = UnitOfWork::new();

    let enhanced = reconciler.reconcile(&payload, &full_response(), &mut work);

    assert_eq!(enhanced, 5);
    assert_eq!(work.translations().len(), 2);
    assert_eq!(work.examples().len(), 2);
    assert_eq!(work.metadata().len(), 5);

    let content_for = |word_id: i64| {
        work.learning_contents()
            .iter()
            .find(|c| c.word_id == word_id)
            .map(|c| c.example)
    };
    assert_eq!(content_for(4), Some(ExampleKey(0)));
    assert_eq!(content_for(3), Some(ExampleKey(1)));

    let content = &work.learning_contents()[0];
    assert_eq!(content.language_code, "ko");
    assert_eq!(content.model_name, "gpt-4o-mini");
    assert_eq!(content.usage_tip, "JLPT N4 level word");
}

/// Words without an example stay pending
#[test]
fn test_reconcile_withMissingExampleGroup_shouldSkipUncoveredWords() {
    let payload = PayloadBuilder::build(&common::abcde_rows());
    let reconciler = ResultReconciler::new("ko", "mock");
    let mut response = full_response();
    response.examples.truncate(1);
    let mut work = UnitOfWork::new();

    let enhanced = reconciler.reconcile(&payload, &response, &mut work);

    assert_eq!(enhanced, 3);
    let enhanced_ids: Vec<i64> = work.metadata().iter().map(|m| m.word_id).collect();
    assert_eq!(enhanced_ids, vec![1, 2, 4]);
    assert_eq!(work.learning_contents().len(), work.metadata().len());
}

#[test]
fn test_reconcile_withUnknownRefs_shouldIgnoreThem() {
    let payload = PayloadBuilder::build(&common::abcde_rows());
    let reconciler = ResultReconciler::new("ko", "mock");
    let mut response = full_response();
    response.translations[0].sentence_ref = 77;
    response.word_definitions.push(definition(99));
    let mut work = UnitOfWork::new();

    let enhanced = reconciler.reconcile(&payload, &response, &mut work);

    assert_eq!(enhanced, 5);
    assert_eq!(work.translations().len(), 1);
    assert_eq!(work.translations()[0].sentence_id, 20);
}

#[test]
fn test_reconcile_withEmptyResponse_shouldWriteNothing() {
    let payload = PayloadBuilder::build(&common::abcde_rows());
    let mut work = UnitOfWork::new();

    let enhanced = ResultReconciler::new("ko", "mock").reconcile(&payload, &AIResponse::default(), &mut work);

    assert_eq!(enhanced, 0);
    assert!(work.is_empty());
}

/// Repeated word and group ids are counted and written once
#[test]
fn test_reconcile_withRepeatedIds_shouldStageEachWordAndGroupOnce() {
    let payload = PayloadBuilder::build(&common::abcde_rows());
    let reconciler = ResultReconciler::new("ko", "mock");
    let mut response = full_response();
    response.word_definitions.push(definition(1));
    response.word_definitions.push(definition(1));
    response.examples.push(example(2, vec![5, 3]));
    let mut work = UnitOfWork::new();

    let enhanced = reconciler.reconcile(&payload, &response, &mut work);

    assert_eq!(enhanced, 5);
    assert_eq!(work.metadata().len(), 5);
    assert_eq!(work.learning_contents().len(), 5);
    assert_eq!(work.examples().len(), 2);
}
