/*!
 * Tests for error types and conversions
 */

use subvocab::errors::{
    AgentError, AppError, EnhanceError, FetchError, GenerationError, MappingError, ProviderError,
    SchemaViolation, ValidationError,
};

#[test]
fn test_generationError_fromProviderError_shouldWrap() {
    let error: GenerationError = ProviderError::RateLimitExceeded("slow down".to_string()).into();
    assert!(matches!(error, GenerationError::Provider(ProviderError::RateLimitExceeded(_))));
    assert_eq!(error.to_string(), "Provider error: Rate limit exceeded: slow down");
}

#[test]
fn test_schemaViolation_display_shouldNameTheField() {
    let violation = SchemaViolation::EmptyField {
        section: "exs",
        index: 2,
        field: "ex_ko",
    };
    assert_eq!(violation.to_string(), "exs[2].ex_ko is empty");

    let error: GenerationError = violation.into();
    assert!(error.to_string().starts_with("Malformed response:"));
}

#[test]
fn test_enhanceError_fromFetchError_shouldKeepSubtitleId() {
    let error: EnhanceError = FetchError::Store {
        subtitle_id: 7,
        message: "locked".to_string(),
    }
    .into();
    assert_eq!(
        error.to_string(),
        "Fetch error: Failed to fetch candidates for subtitle 7: locked"
    );
}

#[test]
fn test_mappingError_display_shouldIncludeIds() {
    assert_eq!(MappingError::UnknownWord(12).to_string(), "unknown word id 12");
    assert_eq!(
        MappingError::NotInGroup { word: 3, group: 1 }.to_string(),
        "word 3 is not a member of group 1"
    );
}

#[test]
fn test_agentError_display_shouldCarryLastValidationError() {
    let error = AgentError::RetriesExhausted {
        retries: 3,
        last_error: ValidationError::MissingField {
            index: 0,
            field: "meaning",
        },
    };
    assert_eq!(
        error.to_string(),
        "Validation failed after 3 attempts: entry 0 is missing required field 'meaning'"
    );
}

#[test]
fn test_appError_conversions_shouldPickMatchingVariant() {
    let from_anyhow: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(from_anyhow, AppError::Unknown(_)));

    let from_io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert!(matches!(from_io, AppError::File(_)));

    let from_enhance: AppError = EnhanceError::InvalidBatchSize(0).into();
    assert!(matches!(from_enhance, AppError::Enhance(EnhanceError::InvalidBatchSize(0))));
}
