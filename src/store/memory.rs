use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PhraseStore, StorageError};

/// In-process phrase store. Contents live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryPhraseStore {
    phrases: RwLock<Vec<String>>,
}

impl MemoryPhraseStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: RwLock::new(phrases.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl PhraseStore for MemoryPhraseStore {
    async fn list_phrases(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.phrases.read().await.clone())
    }

    async fn insert_phrase(&self, text: &str) -> Result<(), StorageError> {
        self.phrases.write().await.push(text.to_string());
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
