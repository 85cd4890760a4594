/*!
 * Database module for persistent storage of vocabulary data.
 *
 * This module provides SQLite-based persistence for:
 * - Imported subtitles, sentences and candidate words
 * - Enhancement output (metadata, learning content, translations, examples)
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use repository::{ImportSummary, Repository};
