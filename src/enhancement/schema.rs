/*!
 * Wire contract for enhancement requests and responses.
 *
 * Responses are decoded in two steps. `check_structure` rejects the whole
 * response on the first structural violation, then `retain_known_refs` drops
 * individual entries whose ids were never part of the request.
 */

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::database::models::GradeLevel;
use crate::errors::{MappingError, SchemaViolation};

/// Request payload sent to the text-generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementRequest {
    pub data: Vec<SentencePayload>,
    pub groups: Vec<GroupPayload>,
}

/// One sentence and the candidate words it contributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentencePayload {
    pub id: i64,
    pub text: String,
    pub words: Vec<WordPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPayload {
    pub id: i64,
    pub base: String,
}

/// A group of up to three words that share one generated example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPayload {
    pub gid: i64,
    pub wids: Vec<i64>,
}

impl EnhancementRequest {
    /// All word ids in the request, in payload order
    pub fn word_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.data.iter().flat_map(|s| s.words.iter().map(|w| w.id))
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Raw response as returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub trans: Vec<RawTranslation>,
    pub words: Vec<RawWord>,
    pub exs: Vec<RawExample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTranslation {
    pub s_id: i64,
    pub tr_ko: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWord {
    pub w_id: i64,
    pub m: String,
    pub r: String,
    pub lv: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExample {
    pub gid: i64,
    pub ex_ja: String,
    pub ex_ko: String,
    pub wids: Vec<i64>,
}

/// Translation of one source sentence
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceTranslation {
    pub sentence_ref: i64,
    pub text: String,
}

/// Definition generated for one word
#[derive(Debug, Clone, PartialEq)]
pub struct WordDefinition {
    pub word_ref: i64,
    pub meaning: String,
    pub reading: String,
    pub level: GradeLevel,
}

/// Example sentence generated for one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupExample {
    pub group_ref: i64,
    pub text: String,
    pub translation: String,
    pub member_word_refs: Vec<i64>,
}

/// A structurally valid response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AIResponse {
    pub translations: Vec<SentenceTranslation>,
    pub word_definitions: Vec<WordDefinition>,
    pub examples: Vec<GroupExample>,
}

impl AIResponse {
    /// First example group that lists the given word
    pub fn example_for_word(&self, word_ref: i64) -> Option<&GroupExample> {
        self.examples
            .iter()
            .find(|ex| ex.member_word_refs.contains(&word_ref))
    }
}

/// Outcome of validating a response against its request
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResponse {
    pub response: AIResponse,
    /// Entries removed because they referenced unknown ids
    pub dropped: Vec<MappingError>,
}

/// Locate the JSON object in a model response.
///
/// Accepts a bare object, a fenced code block, or an object embedded in prose.
pub fn extract_json(response: &str) -> Result<&str, SchemaViolation> {
    let trimmed = response.trim();

    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }

    if let Some(start) = trimmed.find("```json") {
        if let Some(end) = trimmed[start + 7..].find("```") {
            return Ok(trimmed[start + 7..start + 7 + end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        if let Some(end) = trimmed[start + 3..].find("```") {
            let json = trimmed[start + 3..start + 3 + end].trim();
            if json.starts_with('{') {
                return Ok(json);
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return Ok(&trimmed[start..=end]);
        }
    }

    Err(SchemaViolation::InvalidJson(
        "no JSON object found in response".to_string(),
    ))
}

/// Decode the raw response body
pub fn parse_response(response: &str) -> Result<RawResponse, SchemaViolation> {
    let json = extract_json(response)?;
    serde_json::from_str(json).map_err(|e| SchemaViolation::InvalidJson(e.to_string()))
}

fn require(
    value: &str,
    section: &'static str,
    index: usize,
    field: &'static str,
) -> Result<String, SchemaViolation> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SchemaViolation::EmptyField {
            section,
            index,
            field,
        });
    }
    Ok(trimmed.to_string())
}

/// Check every entry of a raw response, stopping at the first violation
pub fn check_structure(raw: RawResponse) -> Result<AIResponse, SchemaViolation> {
    let mut response = AIResponse::default();

    for (index, t) in raw.trans.into_iter().enumerate() {
        response.translations.push(SentenceTranslation {
            sentence_ref: t.s_id,
            text: require(&t.tr_ko, "trans", index, "tr_ko")?,
        });
    }

    for (index, w) in raw.words.into_iter().enumerate() {
        let level = w
            .lv
            .parse::<GradeLevel>()
            .map_err(|_| SchemaViolation::InvalidLevel {
                index,
                value: w.lv.clone(),
            })?;
        response.word_definitions.push(WordDefinition {
            word_ref: w.w_id,
            meaning: require(&w.m, "words", index, "m")?,
            reading: require(&w.r, "words", index, "r")?,
            level,
        });
    }

    for (index, ex) in raw.exs.into_iter().enumerate() {
        if ex.wids.is_empty() {
            return Err(SchemaViolation::EmptyGroup { index });
        }
        response.examples.push(GroupExample {
            group_ref: ex.gid,
            text: require(&ex.ex_ja, "exs", index, "ex_ja")?,
            translation: require(&ex.ex_ko, "exs", index, "ex_ko")?,
            member_word_refs: ex.wids,
        });
    }

    Ok(response)
}

/// Drop entries that reference ids absent from the request.
///
/// Only the first definition per word and the first example per group are
/// kept. Example members are narrowed to the words the request placed in that
/// group; an example left with no members is dropped.
pub fn retain_known_refs(
    response: AIResponse,
    request: &EnhancementRequest,
) -> ValidatedResponse {
    let sentence_ids: HashSet<i64> = request.data.iter().map(|s| s.id).collect();
    let word_ids: HashSet<i64> = request.word_ids().collect();
    let groups: HashMap<i64, &GroupPayload> =
        request.groups.iter().map(|g| (g.gid, g)).collect();

    let mut dropped = Vec::new();

    let translations = response
        .translations
        .into_iter()
        .filter(|t| {
            let known = sentence_ids.contains(&t.sentence_ref);
            if !known {
                dropped.push(MappingError::UnknownSentence(t.sentence_ref));
            }
            known
        })
        .collect();

    let mut defined = HashSet::new();
    let word_definitions = response
        .word_definitions
        .into_iter()
        .filter(|w| {
            if !word_ids.contains(&w.word_ref) {
                dropped.push(MappingError::UnknownWord(w.word_ref));
                return false;
            }
            if !defined.insert(w.word_ref) {
                dropped.push(MappingError::DuplicateWord(w.word_ref));
                return false;
            }
            true
        })
        .collect();

    let mut seen_groups = HashSet::new();
    let mut examples = Vec::with_capacity(response.examples.len());
    for mut example in response.examples {
        let Some(group) = groups.get(&example.group_ref) else {
            dropped.push(MappingError::UnknownGroup(example.group_ref));
            continue;
        };
        if !seen_groups.insert(example.group_ref) {
            dropped.push(MappingError::DuplicateGroup(example.group_ref));
            continue;
        }

        example.member_word_refs.retain(|wid| {
            let member = group.wids.contains(wid);
            if !member {
                dropped.push(MappingError::NotInGroup {
                    word: *wid,
                    group: group.gid,
                });
            }
            member
        });

        if example.member_word_refs.is_empty() {
            dropped.push(MappingError::UnknownGroup(example.group_ref));
            continue;
        }
        examples.push(example);
    }

    ValidatedResponse {
        response: AIResponse {
            translations,
            word_definitions,
            examples,
        },
        dropped,
    }
}

/// Parse, check and reconcile a response body against its request
pub fn validate_response(
    body: &str,
    request: &EnhancementRequest,
) -> Result<ValidatedResponse, SchemaViolation> {
    let raw = parse_response(body)?;
    let checked = check_structure(raw)?;
    Ok(retain_known_refs(checked, request))
}
