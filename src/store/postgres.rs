use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, MutexGuard, Semaphore, SemaphorePermit};
use tokio_postgres::Client;

use super::{PhraseStore, StorageError, CREATE_TABLE_SQL, INSERT_PHRASE_SQL, SELECT_PHRASES_SQL};
use crate::session::{self, SessionTimeouts};

/// Postgres-backed phrase store over `pool_size` connection slots.
///
/// At most `pool_size` operations are in flight at once; callers beyond that
/// wait on the semaphore. Every slot is filled at startup so a bad URL fails
/// fast. Afterwards a slot whose connection has closed (server restart,
/// terminated backend) is reopened on its next checkout; if that fails the
/// call fails with [`StorageError::Unavailable`] and the next one tries again.
pub struct PgPhraseStore {
    database_url: String,
    timeouts: SessionTimeouts,
    slots: Vec<Mutex<Option<Client>>>,
    next: AtomicUsize,
    permits: Semaphore,
}

/// A slot held for the length of one operation.
struct Checkout<'a> {
    _permit: SemaphorePermit<'a>,
    slot: MutexGuard<'a, Option<Client>>,
}

impl Checkout<'_> {
    fn client(&self) -> Result<&Client, StorageError> {
        self.slot
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("connection slot is empty".to_string()))
    }
}

impl PgPhraseStore {
    pub async fn connect(
        database_url: &str,
        pool_size: usize,
        timeouts: &SessionTimeouts,
    ) -> Result<Self, StorageError> {
        if pool_size == 0 {
            return Err(StorageError::Connect(
                "pool_size must be at least 1".to_string(),
            ));
        }

        let mut slots = Vec::with_capacity(pool_size);
        for slot in 0..pool_size {
            let client = session::connect(database_url, timeouts, slot)
                .await
                .map_err(|e| StorageError::Connect(format!("{e:#}")))?;
            slots.push(Mutex::new(Some(client)));
        }

        tracing::debug!(pool_size, timeouts = %timeouts, "phrase store connected");

        Ok(Self {
            database_url: database_url.to_string(),
            timeouts: *timeouts,
            slots,
            next: AtomicUsize::new(0),
            permits: Semaphore::new(pool_size),
        })
    }

    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    /// Wait for a permit, take a free slot round-robin, and make sure it
    /// holds an open connection.
    async fn checkout(&self) -> Result<Checkout<'_>, StorageError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let (index, mut slot) = self.lock_slot().await;

        if slot.as_ref().map_or(true, Client::is_closed) {
            *slot = None;
            tracing::info!(slot = index, "reopening phrase store connection");
            let client = session::connect(&self.database_url, &self.timeouts, index)
                .await
                .map_err(|e| StorageError::Unavailable(format!("reconnect failed: {e:#}")))?;
            *slot = Some(client);
        }

        Ok(Checkout {
            _permit: permit,
            slot,
        })
    }

    /// Holding a permit means at least one slot is unlocked, so the scan
    /// normally succeeds; the blocking lock is only a fallback.
    async fn lock_slot(&self) -> (usize, MutexGuard<'_, Option<Client>>) {
        let start = self.next.fetch_add(1, Ordering::Relaxed);
        let len = self.slots.len();
        for offset in 0..len {
            let index = (start + offset) % len;
            if let Ok(guard) = self.slots[index].try_lock() {
                return (index, guard);
            }
        }
        let index = start % len;
        (index, self.slots[index].lock().await)
    }
}

#[async_trait]
impl PhraseStore for PgPhraseStore {
    async fn list_phrases(&self) -> Result<Vec<String>, StorageError> {
        let checkout = self.checkout().await?;
        let rows = checkout.client()?.query(SELECT_PHRASES_SQL, &[]).await?;

        let mut phrases = Vec::with_capacity(rows.len());
        for row in rows {
            // The column is nullable; NULL rows cannot take part in matching.
            if let Some(phrase) = row.try_get::<_, Option<String>>(0)? {
                phrases.push(phrase);
            }
        }
        Ok(phrases)
    }

    async fn insert_phrase(&self, text: &str) -> Result<(), StorageError> {
        let checkout = self.checkout().await?;
        checkout.client()?.execute(INSERT_PHRASE_SQL, &[&text]).await?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        let checkout = self.checkout().await?;
        checkout.client()?.batch_execute(CREATE_TABLE_SQL).await?;
        Ok(())
    }
}
