/*!
 * Extract, generate and validate with a bounded number of retries.
 *
 * ```text
 * Extract -> Generate -> Validate -> End
 *               ^            |
 *               +-- retry ---+   (error and retry_count < max_retries)
 * ```
 */

use log::{info, warn};

use super::state::{AgentState, Node, WordEntryDraft};
use super::steps::AgentSteps;
use crate::errors::{AgentError, ValidationError};

/// Validation failures allowed before the pipeline gives up
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Check generated entries, reporting the first problem found
pub fn validate_entries(entries: &[WordEntryDraft], fault: Option<&str>) -> Result<(), ValidationError> {
    if entries.is_empty() {
        return Err(ValidationError::NoEntries {
            detail: fault.unwrap_or("model returned no entries").to_string(),
        });
    }

    let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());

    for (index, entry) in entries.iter().enumerate() {
        if !present(&entry.meaning) {
            return Err(ValidationError::MissingField { index, field: "meaning" });
        }
        if !present(&entry.example) {
            return Err(ValidationError::MissingField { index, field: "example" });
        }
    }

    Ok(())
}

/// Next node after validation
pub fn decide_next(state: &AgentState, max_retries: u32) -> Node {
    if state.error.is_some() && state.retry_count < max_retries {
        Node::Generate
    } else {
        Node::End
    }
}

/// Runs the generation pipeline over a set of steps
pub struct RetryValidationStateMachine<S: AgentSteps> {
    steps: S,
    max_retries: u32,
}

impl<S: AgentSteps> RetryValidationStateMachine<S> {
    pub fn new(steps: S) -> Self {
        Self {
            steps,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run the pipeline to completion.
    ///
    /// Returns the final state when validation passed, otherwise the last
    /// validation error once the retry budget is spent.
    pub async fn run(&self, subtitle_raw: &str) -> Result<AgentState, AgentError> {
        let mut state = AgentState::new(subtitle_raw);
        let mut node = Node::Extract;

        while node != Node::End {
            state.visited.push(node);
            node = match node {
                Node::Extract => {
                    state.selected_words = self
                        .steps
                        .extract(&state.subtitle_raw)
                        .await
                        .map_err(AgentError::Extract)?;
                    state.retry_count = 0;
                    Node::Generate
                }
                Node::Generate => {
                    state.generate_attempts += 1;
                    let generated = self
                        .steps
                        .generate(&state.subtitle_raw, &state.selected_words)
                        .await;
                    match generated {
                        Ok(entries) => {
                            state.word_entries = entries;
                            state.generation_fault = None;
                        }
                        Err(e) => {
                            warn!("Generation attempt {} failed: {}", state.generate_attempts, e);
                            state.word_entries.clear();
                            state.generation_fault = Some(e.to_string());
                        }
                    }
                    Node::Validate
                }
                Node::Validate => {
                    let checked =
                        validate_entries(&state.word_entries, state.generation_fault.as_deref());
                    match checked {
                        Ok(()) => state.error = None,
                        Err(e) => {
                            state.retry_count += 1;
                            warn!("Validation failed (attempt {}): {}", state.retry_count, e);
                            state.error = Some(e);
                        }
                    }
                    decide_next(&state, self.max_retries)
                }
                Node::End => Node::End,
            };
        }
        state.visited.push(Node::End);

        match state.error.clone() {
            None => {
                info!("Generated {} word entries", state.word_entries.len());
                Ok(state)
            }
            Some(last_error) => Err(AgentError::RetriesExhausted {
                retries: state.retry_count,
                last_error,
            }),
        }
    }
}
