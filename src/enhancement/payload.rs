/*!
 * Payload construction for enhancement batches.
 *
 * Words are bucketed by the sentence they first appear in, then interleaved
 * across sentences so that each group of three mixes context from several
 * sentences. Everything here is pure and synchronous.
 */

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::schema::{EnhancementRequest, GroupPayload, SentencePayload, WordPayload};

/// Maximum number of words sharing one generated example
pub const GROUP_SIZE: usize = 3;

/// A word pending enhancement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateWord {
    pub id: i64,
    pub base_form: String,
    pub sentence_id: i64,
}

/// A source sentence as referenced by a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceContext {
    pub id: i64,
    pub text: String,
}

/// One row of the pending-work selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRow {
    pub word: CandidateWord,
    pub sentence_text: String,
}

impl CandidateRow {
    pub fn new(
        word_id: i64,
        base_form: impl Into<String>,
        sentence_id: i64,
        sentence_text: impl Into<String>,
    ) -> Self {
        Self {
            word: CandidateWord {
                id: word_id,
                base_form: base_form.into(),
                sentence_id,
            },
            sentence_text: sentence_text.into(),
        }
    }
}

/// A sentence together with the candidate words it contributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceTask {
    pub sentence: SentenceContext,
    pub words: Vec<CandidateWord>,
}

/// A built request plus the lookups needed to reconcile its response
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPayload {
    pub request: EnhancementRequest,
    /// Reference id -> store id of each sentence in the request
    pub sentence_refs: HashMap<i64, i64>,
}

impl BatchPayload {
    pub fn sentence_count(&self) -> usize {
        self.request.data.len()
    }

    pub fn word_count(&self) -> usize {
        self.request.word_ids().count()
    }

    /// Resolve a response sentence reference to its store id
    pub fn resolve_sentence(&self, reference: i64) -> Option<i64> {
        self.sentence_refs.get(&reference).copied()
    }
}

/// Group rows by originating sentence, keeping first-seen order.
///
/// A word listed twice keeps only its first occurrence.
pub fn group_by_sentence(rows: &[CandidateRow]) -> Vec<SentenceTask> {
    let mut tasks: Vec<SentenceTask> = Vec::new();
    let mut index_by_sentence: HashMap<i64, usize> = HashMap::new();
    let mut seen_words: HashSet<i64> = HashSet::new();

    for row in rows {
        if !seen_words.insert(row.word.id) {
            continue;
        }

        let index = *index_by_sentence
            .entry(row.word.sentence_id)
            .or_insert_with(|| {
                tasks.push(SentenceTask {
                    sentence: SentenceContext {
                        id: row.word.sentence_id,
                        text: row.sentence_text.clone(),
                    },
                    words: Vec::new(),
                });
                tasks.len() - 1
            });

        tasks[index].words.push(row.word.clone());
    }

    tasks
}

/// Round-robin over buckets: one item from each non-exhausted bucket per pass
pub fn interleave<T: Copy>(buckets: &[Vec<T>]) -> Vec<T> {
    let total = buckets.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    let mut depth = 0;

    while merged.len() < total {
        for bucket in buckets {
            if let Some(item) = bucket.get(depth) {
                merged.push(*item);
            }
        }
        depth += 1;
    }

    merged
}

/// Split ids into consecutive groups of `GROUP_SIZE`, numbering from 1
pub fn partition_groups(word_ids: &[i64]) -> Vec<GroupPayload> {
    word_ids
        .chunks(GROUP_SIZE)
        .enumerate()
        .map(|(index, chunk)| GroupPayload {
            gid: index as i64 + 1,
            wids: chunk.to_vec(),
        })
        .collect()
}

/// Builds enhancement requests from pending candidate words
pub struct PayloadBuilder;

impl PayloadBuilder {
    /// Build a request from raw selection rows
    pub fn build(rows: &[CandidateRow]) -> BatchPayload {
        Self::from_tasks(&group_by_sentence(rows))
    }

    /// Build a request from sentences already grouped with their words
    pub fn from_tasks(tasks: &[SentenceTask]) -> BatchPayload {
        let data: Vec<SentencePayload> = tasks
            .iter()
            .map(|task| SentencePayload {
                id: task.sentence.id,
                text: task.sentence.text.clone(),
                words: task
                    .words
                    .iter()
                    .map(|w| WordPayload {
                        id: w.id,
                        base: w.base_form.clone(),
                    })
                    .collect(),
            })
            .collect();

        let buckets: Vec<Vec<i64>> = tasks
            .iter()
            .map(|task| task.words.iter().map(|w| w.id).collect())
            .collect();
        let groups = partition_groups(&interleave(&buckets));

        let sentence_refs = tasks
            .iter()
            .map(|task| (task.sentence.id, task.sentence.id))
            .collect();

        BatchPayload {
            request: EnhancementRequest { data, groups },
            sentence_refs,
        }
    }
}
