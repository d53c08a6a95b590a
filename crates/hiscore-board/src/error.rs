use std::path::PathBuf;

use hiscore_store::StoreError;
use hiscore_types::ValidationError;
use thiserror::Error;

/// Errors from writing, reading, or listing backup artifacts.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backup serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backup {path} failed verification: wrote {expected} records, read back {found}")]
    Verification {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("no free backup name for run starting {0}")]
    NameExhausted(String),
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("score store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("compaction aborted before any scores were removed: {0}")]
    CompactionAborted(#[source] BackupError),

    #[error("another compaction or restore is already running")]
    CompactionInProgress,

    #[error("replacing scores failed, restore from {backup}: {source}")]
    ReplaceFailed {
        backup: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Backup(#[from] BackupError),
}

impl From<StoreError> for LeaderboardError {
    fn from(e: StoreError) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}

pub type LeaderboardResult<T> = Result<T, LeaderboardError>;
