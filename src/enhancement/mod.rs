/*!
 * Batch enhancement of pending vocabulary.
 *
 * - `payload`: groups candidate words into cross-sentence request payloads
 * - `schema`: request/response wire contract and response validation
 * - `client`: one generation round trip through a `Provider`
 * - `reconciler`: maps validated responses onto pending writes
 * - `unit_of_work`: writes collected during a run
 * - `orchestrator`: bounded-concurrency batch runner
 */

pub mod client;
pub mod orchestrator;
pub mod payload;
pub mod prompts;
pub mod reconciler;
pub mod schema;
pub mod unit_of_work;

pub use client::{ClientSettings, EnhancementClient};
pub use orchestrator::{BatchFailure, BatchOrchestrator, EnhancementReport, EnhancementStore};
pub use payload::{
    BatchPayload, CandidateRow, CandidateWord, PayloadBuilder, SentenceContext, SentenceTask,
};
pub use reconciler::ResultReconciler;
pub use schema::{AIResponse, EnhancementRequest};
pub use unit_of_work::UnitOfWork;
