/*!
 * # subvocab - Subtitle vocabulary enhancement
 *
 * A Rust library that turns tokenized Japanese subtitles into study material
 * using AI: sentence translations, word meanings, readings, JLPT levels and
 * shared example sentences.
 *
 * ## Features
 *
 * - Import tokenized subtitles into SQLite, filtering symbols and kana noise
 * - Enhance pending words in concurrent batches through various AI providers:
 *   - Ollama (local LLM)
 *   - OpenAI API
 *   - Anthropic API
 * - Validate every model reply against a strict schema before anything is stored
 * - Commit all writes of a run atomically
 * - Single-shot vocabulary generation with bounded retries
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `ingest`: Subtitle document loading and import planning
 * - `word_filter`: Word eligibility rules
 * - `database`: SQLite storage and the enhancement store
 * - `enhancement`: Batch enhancement pipeline:
 *   - `enhancement::payload`: Sentence grouping and payload building
 *   - `enhancement::client`: Structured generation with schema validation
 *   - `enhancement::reconciler`: Mapping replies back onto stored ids
 *   - `enhancement::orchestrator`: Concurrent batch execution
 * - `agent`: Extract, generate and validate pipeline with retries
 * - `app_controller`: Main application controller
 * - `providers`: Client implementations for various LLM providers:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::openai`: OpenAI API client
 *   - `providers::anthropic`: Anthropic API client
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(non_snake_case)]

// Public modules
pub mod agent;
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod enhancement;
pub mod errors;
pub mod ingest;
pub mod providers;
pub mod word_filter;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use database::Repository;
pub use enhancement::{BatchOrchestrator, EnhancementClient, EnhancementReport, UnitOfWork};
pub use errors::{AppError, EnhanceError, GenerationError, ProviderError};
