use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// Steps of the generation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Extract,
    Generate,
    Validate,
    End,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Node::Extract => "extract",
            Node::Generate => "generate",
            Node::Validate => "validate",
            Node::End => "end",
        };
        f.write_str(name)
    }
}

/// A vocabulary card as produced by the model; fields may be missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEntryDraft {
    pub word: String,
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
}

impl WordEntryDraft {
    pub fn new(word: impl Into<String>, meaning: impl Into<String>, example: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            meaning: Some(meaning.into()),
            example: Some(example.into()),
        }
    }
}

/// State carried between the pipeline steps
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    pub subtitle_raw: String,
    pub selected_words: Vec<String>,
    pub word_entries: Vec<WordEntryDraft>,
    /// Failed validations so far
    pub retry_count: u32,
    /// Last validation failure; cleared when validation passes
    pub error: Option<ValidationError>,
    /// Last generation fault, kept for diagnostics
    pub generation_fault: Option<String>,
    pub generate_attempts: u32,
    /// Nodes in the order they ran
    pub visited: Vec<Node>,
}

impl AgentState {
    pub fn new(subtitle_raw: impl Into<String>) -> Self {
        Self {
            subtitle_raw: subtitle_raw.into(),
            selected_words: Vec::new(),
            word_entries: Vec::new(),
            retry_count: 0,
            error: None,
            generation_fault: None,
            generate_attempts: 0,
            visited: Vec::new(),
        }
    }
}
