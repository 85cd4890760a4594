/*!
 * Database schema definitions and migrations.
 *
 * Tables mirror the vocabulary domain: subtitles and their sentences, the
 * candidate words found in them, and the records produced by enhancement
 * (metadata, learning content, sentence translations, generated examples).
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Foreign keys are per-connection in SQLite
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // Subtitles and their sentences
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS subtitles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_type TEXT NOT NULL,
            source_key TEXT NOT NULL,
            language TEXT NOT NULL,
            title TEXT,
            status TEXT NOT NULL DEFAULT 'PENDING',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subtitle_sentences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subtitle_id INTEGER NOT NULL REFERENCES subtitles(id),
            language_code TEXT NOT NULL DEFAULT 'ja',
            sentence_text TEXT NOT NULL,
            sentence_order INTEGER NOT NULL,
            start_time REAL,
            end_time REAL
        );

        CREATE INDEX IF NOT EXISTS idx_sentences_subtitle ON subtitle_sentences(subtitle_id, sentence_order);
        "#,
    )?;

    // Candidate words and their per-word metadata
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS word_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subtitle_id INTEGER NOT NULL REFERENCES subtitles(id),
            first_occurrence_id INTEGER REFERENCES subtitle_sentences(id),
            base_form TEXT NOT NULL,
            language TEXT NOT NULL,
            part_of_speech TEXT,
            frequency INTEGER NOT NULL DEFAULT 1,
            is_valid INTEGER NOT NULL DEFAULT 1,
            skip_reason TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_words_subtitle ON word_entries(subtitle_id, is_valid);

        CREATE TABLE IF NOT EXISTS japanese_word_metadata (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word_entry_id INTEGER NOT NULL UNIQUE REFERENCES word_entries(id),
            reading TEXT,
            jlpt_level TEXT
        );
        "#,
    )?;

    // Generated examples; one per resolved word group
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS example_sentences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sentence_text TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS example_translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            example_id INTEGER NOT NULL REFERENCES example_sentences(id),
            language_code TEXT NOT NULL,
            translated_text TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_example_translations ON example_translations(example_id);
        "#,
    )?;

    // Learning content and subtitle translations
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS word_learning_contents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word_entry_id INTEGER NOT NULL UNIQUE REFERENCES word_entries(id),
            example_id INTEGER REFERENCES example_sentences(id),
            meaning TEXT NOT NULL,
            language_code TEXT NOT NULL DEFAULT 'ko',
            usage_tip TEXT,
            model_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subtitle_translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subtitle_sentence_id INTEGER NOT NULL REFERENCES subtitle_sentences(id),
            language_code TEXT NOT NULL,
            translated_text TEXT NOT NULL,
            CONSTRAINT uq_sentence_lang UNIQUE (subtitle_sentence_id, language_code)
        );
        "#,
    )?;

    info!("Database schema created successfully");
    Ok(())
}

/// Migrate the schema from one version to another
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<()> {
    // No migrations exist yet; any older version is unknown
    if from_version < SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Unknown schema version: {}. Cannot migrate.",
            from_version
        ));
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    info!("Schema migration completed to v{}", SCHEMA_VERSION);
    Ok(())
}
