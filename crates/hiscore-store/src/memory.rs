use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use hiscore_types::{NewScore, ScoreRecord};

use crate::error::{StoreError, StoreResult};
use crate::traits::ScoreStore;

/// In-memory, `Vec`-based score store.
///
/// Intended for tests and embedding. Records are held behind a `RwLock`;
/// `replace_all` swaps the whole vector under one write lock, so readers
/// never observe a partially replaced set.
pub struct InMemoryScoreStore {
    records: RwLock<Vec<ScoreRecord>>,
}

impl InMemoryScoreStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a store pre-loaded with `records`, in the given order.
    pub fn with_records(records: Vec<ScoreRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.read().map(|r| r.len()).unwrap_or_default()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Vec<ScoreRecord>>> {
        self.records
            .read()
            .map_err(|_| StoreError::Unavailable("score lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Vec<ScoreRecord>>> {
        self.records
            .write()
            .map_err(|_| StoreError::Unavailable("score lock poisoned".into()))
    }
}

impl Default for InMemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn append(&self, score: NewScore) -> StoreResult<ScoreRecord> {
        let mut records = self.write()?;
        let record = score.into_record(Utc::now());
        records.push(record.clone());
        Ok(record)
    }

    async fn list_all(&self) -> StoreResult<Vec<ScoreRecord>> {
        Ok(self.read()?.clone())
    }

    async fn replace_all(&self, records: Vec<ScoreRecord>) -> StoreResult<()> {
        *self.write()? = records;
        Ok(())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }
}

impl std::fmt::Debug for InMemoryScoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryScoreStore")
            .field("record_count", &self.len())
            .finish()
    }
}
