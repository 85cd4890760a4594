/*!
 * Error types for the subvocab application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Propagation policy: batch-level faults (`GenerationError`, `MappingError`) never
 * escalate past the orchestrator; only `FetchError` and commit failures end a run.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Structural problems found while checking a generation response.
///
/// Checking stops at the first violation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    /// The response could not be located or decoded as JSON
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    /// A required text field is empty
    #[error("{section}[{index}].{field} is empty")]
    EmptyField {
        section: &'static str,
        index: usize,
        field: &'static str,
    },

    /// Grade level outside N1..N5
    #[error("words[{index}].lv has unsupported grade level '{value}'")]
    InvalidLevel { index: usize, value: String },

    /// An example that lists no member words
    #[error("exs[{index}] lists no word ids")]
    EmptyGroup { index: usize },
}

/// Errors raised by one generation round trip. Scoped to a single batch.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Network or API failure from the provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The call did not finish within the configured timeout
    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    /// The response did not match the expected structure
    #[error("Malformed response: {0}")]
    Schema(#[from] SchemaViolation),

    /// The request payload could not be serialized
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// No generation slot could be obtained
    #[error("Generation cancelled: {0}")]
    Cancelled(String),
}

/// A response entry that references an id absent from the originating request.
///
/// These are logged and the entry is skipped; they are never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("unknown sentence id {0}")]
    UnknownSentence(i64),

    #[error("unknown word id {0}")]
    UnknownWord(i64),

    #[error("unknown group id {0}")]
    UnknownGroup(i64),

    #[error("word {0} is not a member of any example group")]
    NoExampleGroup(i64),

    #[error("word {word} is not a member of group {group}")]
    NotInGroup { word: i64, group: i64 },

    #[error("duplicate definition for word id {0}")]
    DuplicateWord(i64),

    #[error("duplicate example for group id {0}")]
    DuplicateGroup(i64),
}

/// Errors while selecting candidate words from the store. Fatal to a run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch candidates for subtitle {subtitle_id}: {message}")]
    Store { subtitle_id: i64, message: String },
}

/// Run-level failures of the batch orchestrator
#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to commit enhancement results: {0}")]
    Commit(String),

    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),
}

/// Content check failures of the retry/validation agent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Nothing was generated
    #[error("no word entries were generated: {detail}")]
    NoEntries { detail: String },

    /// An entry is missing a required field
    #[error("entry {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },
}

/// Failures surfaced by a complete agent run
#[derive(Error, Debug)]
pub enum AgentError {
    /// Word extraction failed before any content could be generated
    #[error("Word extraction failed: {0}")]
    Extract(GenerationError),

    /// Validation still failed after the retry budget was spent
    #[error("Validation failed after {retries} attempts: {last_error}")]
    RetriesExhausted {
        retries: u32,
        last_error: ValidationError,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the enhancement run
    #[error("Enhancement error: {0}")]
    Enhance(#[from] EnhanceError),

    /// Error from the agent pipeline
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
