/*!
 * Single-shot vocabulary generation with bounded retries.
 *
 * Unlike the batch orchestrator this pipeline works on raw subtitle text:
 * it asks the model for the words worth studying, generates a card for
 * each, and regenerates until the cards pass validation or the retry
 * budget runs out. There is no backoff between attempts.
 */

pub mod graph;
pub mod state;
pub mod steps;

pub use graph::{DEFAULT_MAX_RETRIES, RetryValidationStateMachine, decide_next, validate_entries};
pub use state::{AgentState, Node, WordEntryDraft};
pub use steps::{AgentSteps, LlmAgentSteps};
