/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::echo()` - Answers every enhancement request with content for all of its ids
 * - `MockProvider::scripted()` - Returns canned responses in order
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::slow()` - Echoes after a delay, for timeout and concurrency tests
 */

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::enhancement::prompts;
use crate::enhancement::schema::{
    EnhancementRequest, RawExample, RawResponse, RawTranslation, RawWord,
};
use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Echo every id of the embedded request
    Echo,
    /// Pop the next scripted response
    Scripted,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns empty response
    Empty,
    /// Echoes after sleeping
    Slow { delay_ms: u64 },
}

/// Decrements the in-flight counter when a call finishes
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock provider for testing generation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    /// Total requests received, shared between clones
    request_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    script: Arc<Mutex<VecDeque<String>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&CompletionRequest) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            script: Arc::new(Mutex::new(VecDeque::new())),
            custom_response: None,
        }
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Responses are returned in order; the last one repeats once the script runs out
    pub fn scripted(responses: Vec<String>) -> Self {
        let provider = Self::new(MockBehavior::Scripted);
        if let Ok(mut script) = provider.script.lock() {
            script.extend(responses);
        }
        provider
    }

    /// Create a mock provider that fails every `fail_every`-th request
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&CompletionRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Build a response that covers every id of a request
    pub fn echo_response(request: &EnhancementRequest) -> RawResponse {
        let trans = request
            .data
            .iter()
            .map(|s| RawTranslation {
                s_id: s.id,
                tr_ko: format!("[ko] {}", s.text),
            })
            .collect();

        let words = request
            .data
            .iter()
            .flat_map(|s| s.words.iter())
            .map(|w| RawWord {
                w_id: w.id,
                m: format!("meaning of {}", w.base),
                r: w.base.clone(),
                lv: "N3".to_string(),
            })
            .collect();

        let exs = request
            .groups
            .iter()
            .map(|g| RawExample {
                gid: g.gid,
                ex_ja: format!("例文{}", g.gid),
                ex_ko: format!("예문 {}", g.gid),
                wids: g.wids.clone(),
            })
            .collect();

        RawResponse { trans, words, exs }
    }

    fn echo_text(request: &CompletionRequest) -> Result<String, ProviderError> {
        let payload = prompts::payload_from_prompt(&request.prompt)
            .ok_or_else(|| ProviderError::RequestFailed("prompt carries no payload".to_string()))?;
        let parsed: EnhancementRequest = serde_json::from_str(payload)
            .map_err(|e| ProviderError::RequestFailed(format!("unreadable payload: {}", e)))?;
        serde_json::to_string(&Self::echo_response(&parsed))
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    fn next_scripted(&self) -> Result<String, ProviderError> {
        let mut script = self
            .script
            .lock()
            .map_err(|_| ProviderError::RequestFailed("script lock poisoned".to_string()))?;
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        next.ok_or_else(|| ProviderError::RequestFailed("script is empty".to_string()))
    }

    fn respond(text: String) -> CompletionResponse {
        CompletionResponse {
            prompt_tokens: Some(10),
            completion_tokens: Some(text.len() as u64 / 4),
            text,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(self.in_flight.clone());

        if let Some(generator) = self.custom_response {
            return Ok(Self::respond(generator(&request)));
        }

        match self.behavior {
            MockBehavior::Echo => Self::echo_text(&request).map(Self::respond),

            MockBehavior::Scripted => self.next_scripted().map(Self::respond),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Self::echo_text(&request).map(Self::respond)
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(CompletionResponse::default()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Self::echo_text(&request).map(Self::respond)
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
