/*!
 * Tests for response checking and id reconciliation
 */

use serde_json::json;

use subvocab::database::models::GradeLevel;
use subvocab::enhancement::payload::PayloadBuilder;
use subvocab::enhancement::schema::{self, EnhancementRequest};
use subvocab::errors::{MappingError, SchemaViolation};

use crate::common;

fn request() -> EnhancementRequest {
    PayloadBuilder::build(&common::abcde_rows()).request
}

fn valid_body() -> serde_json::Value {
    json!({
        "trans": [{"s_id": 10, "tr_ko": "문장 1"}, {"s_id": 20, "tr_ko": "문장 2"}],
        "words": [
            {"w_id": 1, "m": "a", "r": "えー", "lv": "N5"},
            {"w_id": 4, "m": "d", "r": "でぃー", "lv": "n3"}
        ],
        "exs": [{"gid": 1, "ex_ja": "例文", "ex_ko": "예문", "wids": [1, 4, 2]}]
    })
}

#[test]
fn test_validateResponse_withValidBody_shouldMapEveryEntry() {
    let validated = schema::validate_response(&valid_body().to_string(), &request()).unwrap();

    assert!(validated.dropped.is_empty());
    let response = validated.response;
    assert_eq!(response.translations.len(), 2);
    assert_eq!(response.word_definitions[1].level, GradeLevel::N3);
    assert_eq!(response.examples[0].member_word_refs, vec![1, 4, 2]);
    assert_eq!(response.example_for_word(4).map(|e| e.group_ref), Some(1));
}

/// Models often wrap their JSON in a fenced block
#[test]
fn test_validateResponse_withFencedJson_shouldParse() {
    let body = format!("Here you go:\n```json\n{}\n```", valid_body());
    assert!(schema::validate_response(&body, &request()).is_ok());
}

#[test]
fn test_validateResponse_withMissingKey_shouldFailAsInvalidJson() {
    let body = json!({"trans": [], "words": []}).to_string();
    assert!(matches!(
        schema::validate_response(&body, &request()),
        Err(SchemaViolation::InvalidJson(_))
    ));
}

#[test]
fn test_validateResponse_withProse_shouldFailAsInvalidJson() {
    assert!(matches!(
        schema::validate_response("I cannot help with that.", &request()),
        Err(SchemaViolation::InvalidJson(_))
    ));
}

#[test]
fn test_validateResponse_withBlankMeaning_shouldReportFieldPosition() {
    let mut body = valid_body();
    body["words"][1]["m"] = json!("  ");

    assert_eq!(
        schema::validate_response(&body.to_string(), &request()).unwrap_err(),
        SchemaViolation::EmptyField {
            section: "words",
            index: 1,
            field: "m"
        }
    );
}

#[test]
fn test_validateResponse_withUnknownLevel_shouldFail() {
    let mut body = valid_body();
    body["words"][0]["lv"] = json!("N7");

    assert!(matches!(
        schema::validate_response(&body.to_string(), &request()),
        Err(SchemaViolation::InvalidLevel { index: 0, .. })
    ));
}

#[test]
fn test_validateResponse_withEmptyGroup_shouldFail() {
    let mut body = valid_body();
    body["exs"][0]["wids"] = json!([]);

    assert_eq!(
        schema::validate_response(&body.to_string(), &request()).unwrap_err(),
        SchemaViolation::EmptyGroup { index: 0 }
    );
}

/// Hallucinated ids are dropped, not fatal
#[test]
fn test_validateResponse_withUnknownIds_shouldDropThoseEntries() {
    let mut body = valid_body();
    body["trans"][1]["s_id"] = json!(99);
    body["words"][0]["w_id"] = json!(42);
    body["exs"] = json!([
        {"gid": 1, "ex_ja": "例文", "ex_ko": "예문", "wids": [1, 5]},
        {"gid": 9, "ex_ja": "例文", "ex_ko": "예문", "wids": [3]}
    ]);

    let validated = schema::validate_response(&body.to_string(), &request()).unwrap();

    assert_eq!(validated.response.translations.len(), 1);
    assert_eq!(validated.response.word_definitions.len(), 1);
    assert_eq!(validated.response.examples.len(), 1);
    assert_eq!(validated.response.examples[0].member_word_refs, vec![1]);
    assert!(validated.dropped.contains(&MappingError::UnknownSentence(99)));
    assert!(validated.dropped.contains(&MappingError::UnknownWord(42)));
    assert!(validated.dropped.contains(&MappingError::NotInGroup { word: 5, group: 1 }));
    assert!(validated.dropped.contains(&MappingError::UnknownGroup(9)));
}

#[test]
fn test_validateResponse_withRepeatedIds_shouldKeepFirstEntry() {
    let mut body = valid_body();
    body["words"] = json!([
        {"w_id": 1, "m": "first", "r": "えー", "lv": "N5"},
        {"w_id": 1, "m": "second", "r": "えー", "lv": "N5"}
    ]);
    body["exs"] = json!([
        {"gid": 1, "ex_ja": "最初", "ex_ko": "처음", "wids": [1, 4]},
        {"gid": 1, "ex_ja": "二番目", "ex_ko": "두번째", "wids": [2]}
    ]);

    let validated = schema::validate_response(&body.to_string(), &request()).unwrap();

    let response = validated.response;
    assert_eq!(response.word_definitions.len(), 1);
    assert_eq!(response.word_definitions[0].meaning, "first");
    assert_eq!(response.examples.len(), 1);
    assert_eq!(response.examples[0].text, "最初");
    assert!(validated.dropped.contains(&MappingError::DuplicateWord(1)));
    assert!(validated.dropped.contains(&MappingError::DuplicateGroup(1)));
}
