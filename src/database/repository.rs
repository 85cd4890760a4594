/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};

use super::connection::DatabaseConnection;
use super::models::{
    CommitSummary, ExampleRecord, LearningContentRecord, PENDING_LEVEL, SentenceRecord,
    SentenceTranslationRecord, SubtitleRecord, SubtitleStatus, WordEntryRecord,
    WordMetadataRecord,
};
use crate::enhancement::orchestrator::EnhancementStore;
use crate::enhancement::payload::{CandidateRow, SentenceContext};
use crate::enhancement::unit_of_work::UnitOfWork;
use crate::errors::FetchError;
use crate::ingest::ImportPlan;

/// Counts written by an import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub subtitle_id: i64,
    pub sentence_count: usize,
    pub word_count: usize,
    pub valid_word_count: usize,
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Import Operations
    // =========================================================================

    /// Store a planned import in a single transaction
    pub async fn store_import(&self, plan: ImportPlan) -> Result<ImportSummary> {
        self.db
            .transaction_async(move |tx| {
                tx.execute(
                    r#"
                    INSERT INTO subtitles (source_type, source_key, language, title, status, created_at)
                    VALUES ('FILE', ?1, ?2, ?3, ?4, datetime('now'))
                    "#,
                    params![
                        plan.source_key,
                        plan.language,
                        plan.title,
                        SubtitleStatus::Pending.to_string()
                    ],
                )?;
                let subtitle_id = tx.last_insert_rowid();

                let mut sentence_ids = Vec::with_capacity(plan.sentences.len());
                for sentence in &plan.sentences {
                    tx.execute(
                        r#"
                        INSERT INTO subtitle_sentences
                            (subtitle_id, language_code, sentence_text, sentence_order, start_time, end_time)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                        "#,
                        params![
                            subtitle_id,
                            plan.language,
                            sentence.text,
                            sentence.order,
                            sentence.start,
                            sentence.end
                        ],
                    )?;
                    sentence_ids.push(tx.last_insert_rowid());
                }

                for word in &plan.words {
                    tx.execute(
                        r#"
                        INSERT INTO word_entries
                            (subtitle_id, first_occurrence_id, base_form, language, part_of_speech,
                             frequency, is_valid, skip_reason)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                        "#,
                        params![
                            subtitle_id,
                            sentence_ids.get(word.first_sentence).copied(),
                            word.base_form,
                            plan.language,
                            word.part_of_speech,
                            word.frequency,
                            word.is_valid(),
                            word.skip_reason.map(|r| r.as_str()),
                        ],
                    )?;
                    let word_id = tx.last_insert_rowid();

                    tx.execute(
                        "INSERT INTO japanese_word_metadata (word_entry_id, reading, jlpt_level) VALUES (?1, ?2, ?3)",
                        params![word_id, word.reading, PENDING_LEVEL],
                    )?;
                }

                Ok(ImportSummary {
                    subtitle_id,
                    sentence_count: plan.sentences.len(),
                    word_count: plan.words.len(),
                    valid_word_count: plan.valid_word_count(),
                })
            })
            .await
    }

    /// Insert a bare subtitle row
    pub async fn create_subtitle(&self, source_key: &str, language: &str) -> Result<i64> {
        let source_key = source_key.to_string();
        let language = language.to_string();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO subtitles (source_type, source_key, language, status, created_at)
                     VALUES ('FILE', ?1, ?2, ?3, datetime('now'))",
                    params![source_key, language, SubtitleStatus::Pending.to_string()],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// Append a sentence to a subtitle
    pub async fn add_sentence(&self, subtitle_id: i64, order: i64, text: &str) -> Result<i64> {
        let text = text.to_string();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO subtitle_sentences (subtitle_id, sentence_text, sentence_order)
                     VALUES (?1, ?2, ?3)",
                    params![subtitle_id, text, order],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// Register a valid word first seen in `sentence_id`, with pending metadata
    pub async fn add_word(&self, subtitle_id: i64, sentence_id: i64, base_form: &str) -> Result<i64> {
        let base_form = base_form.to_string();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO word_entries (subtitle_id, first_occurrence_id, base_form, language, is_valid)
                     VALUES (?1, ?2, ?3, 'ja', 1)",
                    params![subtitle_id, sentence_id, base_form],
                )?;
                let word_id = conn.last_insert_rowid();
                conn.execute(
                    "INSERT INTO japanese_word_metadata (word_entry_id, jlpt_level) VALUES (?1, ?2)",
                    params![word_id, PENDING_LEVEL],
                )?;
                Ok(word_id)
            })
            .await
    }

    /// Mark a subtitle's processing status
    pub async fn set_subtitle_status(&self, subtitle_id: i64, status: SubtitleStatus) -> Result<()> {
        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "UPDATE subtitles SET status = ?1 WHERE id = ?2",
                    params![status.to_string(), subtitle_id],
                )?;
                Ok(())
            })
            .await
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Get a subtitle by ID
    pub async fn get_subtitle(&self, subtitle_id: i64) -> Result<Option<SubtitleRecord>> {
        self.db
            .execute_async(move |conn| {
                let record = conn
                    .query_row(
                        "SELECT id, source_type, source_key, language, title, status, created_at
                         FROM subtitles WHERE id = ?1",
                        [subtitle_id],
                        |row| {
                            Ok(SubtitleRecord {
                                id: row.get(0)?,
                                source_type: row.get(1)?,
                                source_key: row.get(2)?,
                                language: row.get(3)?,
                                title: row.get(4)?,
                                status: row.get::<_, String>(5)?.parse().map_err(
                                    |e: anyhow::Error| {
                                        rusqlite::Error::FromSqlConversionFailure(
                                            5,
                                            rusqlite::types::Type::Text,
                                            e.into(),
                                        )
                                    },
                                )?,
                                created_at: row.get(6)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(record)
            })
            .await
    }

    /// Valid, still-pending words joined to their first-occurrence sentence
    pub async fn fetch_pending_candidates(&self, subtitle_id: i64) -> Result<Vec<CandidateRow>> {
        self.db
            .execute_async(move |conn| Self::fetch_pending_sync(conn, subtitle_id))
            .await
    }

    fn fetch_pending_sync(conn: &Connection, subtitle_id: i64) -> Result<Vec<CandidateRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT w.id, w.base_form, s.id, s.sentence_text
            FROM word_entries w
            JOIN subtitle_sentences s ON s.id = w.first_occurrence_id
            LEFT JOIN japanese_word_metadata m ON m.word_entry_id = w.id
            WHERE w.subtitle_id = ?1
              AND w.is_valid = 1
              AND (m.id IS NULL OR m.jlpt_level = ?2)
            ORDER BY s.sentence_order, w.id
            "#,
        )?;

        let rows = stmt
            .query_map(params![subtitle_id, PENDING_LEVEL], |row| {
                Ok(CandidateRow::new(
                    row.get(0)?,
                    row.get::<_, String>(1)?,
                    row.get(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Found {} pending words for subtitle {}", rows.len(), subtitle_id);
        Ok(rows)
    }

    /// Sentences of a subtitle in order
    pub async fn list_sentences(&self, subtitle_id: i64) -> Result<Vec<SentenceContext>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, sentence_text FROM subtitle_sentences
                     WHERE subtitle_id = ?1 ORDER BY sentence_order",
                )?;
                let sentences = stmt
                    .query_map([subtitle_id], |row| {
                        Ok(SentenceContext {
                            id: row.get(0)?,
                            text: row.get(1)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(sentences)
            })
            .await
    }

    /// Full sentence rows of a subtitle in order
    pub async fn get_sentences(&self, subtitle_id: i64) -> Result<Vec<SentenceRecord>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, subtitle_id, language_code, sentence_text, sentence_order, start_time, end_time
                     FROM subtitle_sentences WHERE subtitle_id = ?1 ORDER BY sentence_order",
                )?;
                let sentences = stmt
                    .query_map([subtitle_id], |row| {
                        Ok(SentenceRecord {
                            id: row.get(0)?,
                            subtitle_id: row.get(1)?,
                            language_code: row.get(2)?,
                            sentence_text: row.get(3)?,
                            sentence_order: row.get(4)?,
                            start_time: row.get(5)?,
                            end_time: row.get(6)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(sentences)
            })
            .await
    }

    /// All word entries of a subtitle, valid or not
    pub async fn get_words(&self, subtitle_id: i64) -> Result<Vec<WordEntryRecord>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, subtitle_id, first_occurrence_id, base_form, language, part_of_speech,
                            frequency, is_valid, skip_reason
                     FROM word_entries WHERE subtitle_id = ?1 ORDER BY id",
                )?;
                let words = stmt
                    .query_map([subtitle_id], |row| {
                        Ok(WordEntryRecord {
                            id: row.get(0)?,
                            subtitle_id: row.get(1)?,
                            first_occurrence_id: row.get(2)?,
                            base_form: row.get(3)?,
                            language: row.get(4)?,
                            part_of_speech: row.get(5)?,
                            frequency: row.get(6)?,
                            is_valid: row.get(7)?,
                            skip_reason: row.get(8)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(words)
            })
            .await
    }

    /// Metadata of one word
    pub async fn get_word_metadata(&self, word_id: i64) -> Result<Option<WordMetadataRecord>> {
        self.db
            .execute_async(move |conn| {
                let record = conn
                    .query_row(
                        "SELECT word_entry_id, reading, jlpt_level
                         FROM japanese_word_metadata WHERE word_entry_id = ?1",
                        [word_id],
                        |row| {
                            Ok(WordMetadataRecord {
                                word_entry_id: row.get(0)?,
                                reading: row.get(1)?,
                                jlpt_level: row.get(2)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(record)
            })
            .await
    }

    /// Learning content of one word
    pub async fn get_learning_content(&self, word_id: i64) -> Result<Option<LearningContentRecord>> {
        self.db
            .execute_async(move |conn| {
                let record = conn
                    .query_row(
                        "SELECT word_entry_id, example_id, meaning, language_code, usage_tip, model_name
                         FROM word_learning_contents WHERE word_entry_id = ?1",
                        [word_id],
                        |row| {
                            Ok(LearningContentRecord {
                                word_entry_id: row.get(0)?,
                                example_id: row.get(1)?,
                                meaning: row.get(2)?,
                                language_code: row.get(3)?,
                                usage_tip: row.get(4)?,
                                model_name: row.get(5)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(record)
            })
            .await
    }

    /// Translations stored for one sentence
    pub async fn get_sentence_translations(
        &self,
        sentence_id: i64,
    ) -> Result<Vec<SentenceTranslationRecord>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT subtitle_sentence_id, language_code, translated_text
                     FROM subtitle_translations WHERE subtitle_sentence_id = ?1 ORDER BY language_code",
                )?;
                let records = stmt
                    .query_map([sentence_id], |row| {
                        Ok(SentenceTranslationRecord {
                            subtitle_sentence_id: row.get(0)?,
                            language_code: row.get(1)?,
                            translated_text: row.get(2)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
    }

    /// An example sentence with its translations
    pub async fn get_example(&self, example_id: i64) -> Result<Option<ExampleRecord>> {
        self.db
            .execute_async(move |conn| {
                let text: Option<String> = conn
                    .query_row(
                        "SELECT sentence_text FROM example_sentences WHERE id = ?1",
                        [example_id],
                        |row| row.get(0),
                    )
                    .optional()?;

                let Some(sentence_text) = text else {
                    return Ok(None);
                };

                let mut stmt = conn.prepare(
                    "SELECT language_code, translated_text FROM example_translations
                     WHERE example_id = ?1 ORDER BY id",
                )?;
                let translations: Vec<(String, String)> = stmt
                    .query_map([example_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                Ok(Some(ExampleRecord {
                    id: example_id,
                    sentence_text,
                    translations,
                }))
            })
            .await
    }

    /// Number of example sentences stored
    pub async fn count_examples(&self) -> Result<i64> {
        self.db
            .execute_async(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM example_sentences", [], |row| row.get(0))?)
            })
            .await
    }

    // =========================================================================
    // Enhancement Writes
    // =========================================================================

    /// Persist a unit of work in one transaction
    pub async fn commit_unit_of_work(&self, work: UnitOfWork) -> Result<CommitSummary> {
        if work.is_empty() {
            return Ok(CommitSummary::default());
        }

        self.db
            .transaction_async(move |tx| {
                let mut summary = CommitSummary::default();

                for translation in work.translations() {
                    tx.execute(
                        r#"
                        INSERT INTO subtitle_translations (subtitle_sentence_id, language_code, translated_text)
                        VALUES (?1, ?2, ?3)
                        ON CONFLICT(subtitle_sentence_id, language_code)
                        DO UPDATE SET translated_text = excluded.translated_text
                        "#,
                        params![translation.sentence_id, translation.language_code, translation.text],
                    )?;
                    summary.translations_upserted += 1;
                }

                let mut example_ids = Vec::with_capacity(work.examples().len());
                for example in work.examples() {
                    tx.execute(
                        "INSERT INTO example_sentences (sentence_text, created_at) VALUES (?1, datetime('now'))",
                        [&example.text],
                    )?;
                    let example_id = tx.last_insert_rowid();
                    tx.execute(
                        "INSERT INTO example_translations (example_id, language_code, translated_text)
                         VALUES (?1, ?2, ?3)",
                        params![example_id, example.language_code, example.translation],
                    )?;
                    example_ids.push(example_id);
                    summary.examples_created += 1;
                }

                for metadata in work.metadata() {
                    tx.execute(
                        r#"
                        INSERT INTO japanese_word_metadata (word_entry_id, reading, jlpt_level)
                        VALUES (?1, ?2, ?3)
                        ON CONFLICT(word_entry_id)
                        DO UPDATE SET reading = excluded.reading, jlpt_level = excluded.jlpt_level
                        "#,
                        params![metadata.word_id, metadata.reading, metadata.level.to_string()],
                    )?;
                    summary.metadata_updated += 1;
                }

                for content in work.learning_contents() {
                    let example_id = example_ids.get(content.example.0).copied().ok_or_else(|| {
                        anyhow::anyhow!(
                            "Learning content for word {} refers to missing example {}",
                            content.word_id,
                            content.example.0
                        )
                    })?;

                    tx.execute(
                        r#"
                        INSERT INTO word_learning_contents
                            (word_entry_id, example_id, meaning, language_code, usage_tip, model_name)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                        ON CONFLICT(word_entry_id)
                        DO UPDATE SET example_id = excluded.example_id,
                                      meaning = excluded.meaning,
                                      language_code = excluded.language_code,
                                      usage_tip = excluded.usage_tip,
                                      model_name = excluded.model_name
                        "#,
                        params![
                            content.word_id,
                            example_id,
                            content.meaning,
                            content.language_code,
                            content.usage_tip,
                            content.model_name
                        ],
                    )?;
                    summary.learning_contents_written += 1;
                }

                Ok(summary)
            })
            .await
    }
}

#[async_trait]
impl EnhancementStore for Repository {
    async fn fetch_pending(&self, subtitle_id: i64) -> Result<Vec<CandidateRow>, FetchError> {
        self.fetch_pending_candidates(subtitle_id)
            .await
            .map_err(|e| FetchError::Store {
                subtitle_id,
                message: e.to_string(),
            })
    }

    async fn commit(&self, work: UnitOfWork) -> Result<CommitSummary> {
        self.commit_unit_of_work(work).await
    }
}
