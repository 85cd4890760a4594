/*!
 * Import of pre-tokenized subtitles.
 *
 * Subtitle parsing and morphological analysis happen upstream; this module
 * accepts their output as JSON and turns it into sentences and candidate
 * words ready to be stored.
 */

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::word_filter::{self, SkipReason};

/// A tokenized subtitle document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleDocument {
    #[serde(default)]
    pub title: Option<String>,
    pub source_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub sentences: Vec<TokenizedSentence>,
}

fn default_language() -> String {
    "ja".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizedSentence {
    pub text: String,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

/// One morpheme as produced by the tokenizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub base_form: String,
    /// Major part of speech, e.g. `名詞`
    pub part_of_speech: String,
    /// Katakana reading, `*` when unknown
    #[serde(default)]
    pub reading: Option<String>,
}

/// A sentence to be stored, in subtitle order
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSentence {
    pub order: i64,
    pub text: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// A candidate word to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWord {
    pub base_form: String,
    pub part_of_speech: String,
    /// Index into `ImportPlan::sentences` of the first occurrence
    pub first_sentence: usize,
    pub frequency: i64,
    pub skip_reason: Option<SkipReason>,
    pub reading: Option<String>,
}

impl PlannedWord {
    pub fn is_valid(&self) -> bool {
        self.skip_reason.is_none()
    }
}

/// Everything an import writes, computed before touching the store
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPlan {
    pub title: Option<String>,
    pub source_key: String,
    pub language: String,
    pub sentences: Vec<PlannedSentence>,
    pub words: Vec<PlannedWord>,
}

impl ImportPlan {
    pub fn valid_word_count(&self) -> usize {
        self.words.iter().filter(|w| w.is_valid()).count()
    }
}

/// Read a tokenized subtitle document from disk
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<SubtitleDocument> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read subtitle document: {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse subtitle document: {:?}", path))
}

/// Turn a document into sentences and deduplicated candidate words
pub fn plan_import(document: &SubtitleDocument) -> Result<ImportPlan> {
    if document.source_key.trim().is_empty() {
        return Err(anyhow!("Subtitle document has no source key"));
    }

    let mut sentences = Vec::new();
    let mut words: Vec<PlannedWord> = Vec::new();
    let mut word_index: HashMap<String, usize> = HashMap::new();

    for (position, sentence) in document.sentences.iter().enumerate() {
        let text = sentence.text.trim();
        if text.is_empty() {
            continue;
        }

        // Order is the line position in the source, so skipped lines leave gaps
        let sentence_index = sentences.len();
        sentences.push(PlannedSentence {
            order: position as i64 + 1,
            text: text.to_string(),
            start: sentence.start,
            end: sentence.end,
        });

        for token in &sentence.tokens {
            if !word_filter::is_content_word(&token.part_of_speech) {
                continue;
            }

            if let Some(&existing) = word_index.get(&token.base_form) {
                words[existing].frequency += 1;
                continue;
            }

            word_index.insert(token.base_form.clone(), words.len());
            words.push(PlannedWord {
                base_form: token.base_form.clone(),
                part_of_speech: token.part_of_speech.clone(),
                first_sentence: sentence_index,
                frequency: 1,
                skip_reason: word_filter::check_word(&token.base_form, &token.part_of_speech),
                reading: word_filter::initial_reading(&token.base_form, token.reading.as_deref()),
            });
        }
    }

    debug!(
        "Planned import of '{}': {} sentences, {} words",
        document.source_key,
        sentences.len(),
        words.len()
    );

    Ok(ImportPlan {
        title: document.title.clone(),
        source_key: document.source_key.clone(),
        language: document.language.clone(),
        sentences,
        words,
    })
}
