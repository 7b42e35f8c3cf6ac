//! Phrase storage.
//!
//! A phrase is a single text column in the `phrases` table. Rows are only
//! ever appended: no updates, no deletes, no uniqueness. Listing returns the
//! whole table in whatever order the backend yields it.

mod memory;
mod postgres;

pub use memory::MemoryPhraseStore;
pub use postgres::PgPhraseStore;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

pub const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS phrases (phrase TEXT)";
pub const SELECT_PHRASES_SQL: &str = "SELECT phrase FROM phrases";
pub const INSERT_PHRASE_SQL: &str = "INSERT INTO phrases (phrase) VALUES ($1)";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to phrase store: {0}")]
    Connect(String),
    #[error("phrase store query failed: {0}")]
    Query(#[from] tokio_postgres::Error),
    #[error("phrase store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PhraseStore: Send + Sync {
    /// All stored phrases, order undefined.
    async fn list_phrases(&self) -> Result<Vec<String>, StorageError>;

    /// Append one phrase. Never deduplicates.
    async fn insert_phrase(&self, text: &str) -> Result<(), StorageError>;

    /// Create the `phrases` table if it is missing.
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Occurrence count per distinct phrase.
    async fn phrase_counts(&self) -> Result<BTreeMap<String, u64>, StorageError> {
        Ok(count_phrases(self.list_phrases().await?))
    }
}

pub fn count_phrases(phrases: Vec<String>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for phrase in phrases {
        *counts.entry(phrase).or_insert(0) += 1;
    }
    counts
}
