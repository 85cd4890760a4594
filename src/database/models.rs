/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Level stored in word metadata until a word has been enhanced
pub const PENDING_LEVEL: &str = "WAIT";

/// JLPT grade level assigned to an enhanced word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeLevel {
    N1,
    N2,
    N3,
    N4,
    N5,
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            GradeLevel::N1 => "N1",
            GradeLevel::N2 => "N2",
            GradeLevel::N3 => "N3",
            GradeLevel::N4 => "N4",
            GradeLevel::N5 => "N5",
        };
        write!(f, "{}", level)
    }
}

impl std::str::FromStr for GradeLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "N1" => Ok(GradeLevel::N1),
            "N2" => Ok(GradeLevel::N2),
            "N3" => Ok(GradeLevel::N3),
            "N4" => Ok(GradeLevel::N4),
            "N5" => Ok(GradeLevel::N5),
            _ => Err(anyhow::anyhow!("Invalid grade level: {}", s)),
        }
    }
}

/// Processing status of an imported subtitle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubtitleStatus {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for SubtitleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubtitleStatus::Pending => write!(f, "PENDING"),
            SubtitleStatus::Completed => write!(f, "COMPLETED"),
            SubtitleStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for SubtitleStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(SubtitleStatus::Pending),
            "COMPLETED" => Ok(SubtitleStatus::Completed),
            "FAILED" => Ok(SubtitleStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid subtitle status: {}", s)),
        }
    }
}

/// Imported subtitle record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleRecord {
    pub id: i64,
    pub source_type: String,
    pub source_key: String,
    pub language: String,
    pub title: Option<String>,
    pub status: SubtitleStatus,
    pub created_at: String,
}

/// One timestamped sentence of a subtitle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub id: i64,
    pub subtitle_id: i64,
    pub language_code: String,
    pub sentence_text: String,
    pub sentence_order: i64,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
}

/// Candidate word registered for a subtitle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEntryRecord {
    pub id: i64,
    pub subtitle_id: i64,
    pub first_occurrence_id: Option<i64>,
    pub base_form: String,
    pub language: String,
    pub part_of_speech: Option<String>,
    pub frequency: i64,
    pub is_valid: bool,
    pub skip_reason: Option<String>,
}

/// Reading and level of one word
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordMetadataRecord {
    pub word_entry_id: i64,
    pub reading: Option<String>,
    /// `WAIT` until enhanced, then `N1`..`N5`
    pub jlpt_level: Option<String>,
}

impl WordMetadataRecord {
    pub fn is_pending(&self) -> bool {
        self.jlpt_level.as_deref() == Some(PENDING_LEVEL)
    }
}

/// Generated learning content for one word
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningContentRecord {
    pub word_entry_id: i64,
    pub example_id: Option<i64>,
    pub meaning: String,
    pub language_code: String,
    pub usage_tip: Option<String>,
    pub model_name: String,
}

/// Translation of a subtitle sentence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceTranslationRecord {
    pub subtitle_sentence_id: i64,
    pub language_code: String,
    pub translated_text: String,
}

/// Generated example sentence with its translation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleRecord {
    pub id: i64,
    pub sentence_text: String,
    pub translations: Vec<(String, String)>,
}

/// Counts written by one unit-of-work commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub translations_upserted: usize,
    pub examples_created: usize,
    pub metadata_updated: usize,
    pub learning_contents_written: usize,
}

impl fmt::Display for CommitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} translations, {} examples, {} metadata rows, {} learning contents",
            self.translations_upserted,
            self.examples_created,
            self.metadata_updated,
            self.learning_contents_written
        )
    }
}
