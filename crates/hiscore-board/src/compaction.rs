use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::MutexGuard;
use tracing::{error, info};

use hiscore_types::ScoreRecord;

use crate::backup::{BackupArtifact, BackupDir};
use crate::error::{BackupError, LeaderboardError, LeaderboardResult};
use crate::reduce::reduce_best;
use crate::service::LeaderboardService;

/// Outcome of one compaction run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactionReport {
    pub started_at: DateTime<Utc>,
    /// `None` when the store was empty and nothing was done.
    pub backup: Option<BackupArtifact>,
    pub records_before: usize,
    pub records_after: usize,
}

impl CompactionReport {
    pub fn removed(&self) -> usize {
        self.records_before - self.records_after
    }
}

/// Held for the length of a compaction or restore run.
pub(crate) struct MaintenanceGuard<'a> {
    _local: MutexGuard<'a, ()>,
    _file: File,
}

impl LeaderboardService {
    /// Collapse the store to one best record per player.
    ///
    /// Steps run strictly in order: snapshot every record to a verified
    /// backup artifact, reduce with the same rule as
    /// [`top_scores`](Self::top_scores) but without truncation, then replace
    /// the store contents. A failed snapshot aborts before anything is
    /// removed. An empty store is a no-op and writes no backup.
    ///
    /// Only one compaction or restore runs at a time per backup directory,
    /// across processes; a second caller gets
    /// [`LeaderboardError::CompactionInProgress`].
    pub async fn compact(&self) -> LeaderboardResult<CompactionReport> {
        let _guard = self.lock_maintenance().await.map_err(|e| match e {
            LeaderboardError::Backup(e) => {
                error!(
                    error = %e,
                    dir = %self.backups.root().display(),
                    "compaction aborted: maintenance lock unavailable, store untouched"
                );
                LeaderboardError::CompactionAborted(e)
            }
            other => other,
        })?;
        let started_at = Utc::now();

        let records = self.bounded("list_all", self.store.list_all()).await?;
        if records.is_empty() {
            info!("no scores to compact");
            return Ok(CompactionReport {
                started_at,
                backup: None,
                records_before: 0,
                records_after: 0,
            });
        }
        let records_before = records.len();

        let backup = match self.snapshot(started_at, records.clone()).await {
            Ok(artifact) => artifact,
            Err(e) => {
                error!(
                    error = %e,
                    dir = %self.backups.root().display(),
                    "compaction aborted: backup failed, store untouched"
                );
                return Err(LeaderboardError::CompactionAborted(e));
            }
        };

        let best = reduce_best(records, self.config.tie_break);
        let records_after = best.len();

        if let Err(source) = self.bounded_raw("replace_all", self.store.replace_all(best)).await {
            error!(
                error = %source,
                backup = %backup.path.display(),
                "replacing scores failed; store contents may be lost, restore from backup"
            );
            return Err(LeaderboardError::ReplaceFailed {
                backup: backup.path,
                source,
            });
        }

        info!(
            before = records_before,
            after = records_after,
            backup = %backup.path.display(),
            "compaction complete"
        );
        Ok(CompactionReport {
            started_at,
            backup: Some(backup),
            records_before,
            records_after,
        })
    }

    /// Replace the store contents with the records in a backup artifact.
    ///
    /// Returns the number of records restored. Excludes concurrent
    /// compaction the same way [`compact`](Self::compact) does.
    pub async fn restore(&self, path: &Path) -> LeaderboardResult<usize> {
        let _guard = self.lock_maintenance().await?;

        let owned = path.to_path_buf();
        let records = run_blocking(move || BackupDir::read(&owned)).await?;
        let count = records.len();

        self.bounded("replace_all", self.store.replace_all(records))
            .await?;
        info!(path = %path.display(), records = count, "store restored from backup");
        Ok(count)
    }

    /// Backup artifacts in the configured backup directory, newest first.
    pub async fn list_backups(&self) -> LeaderboardResult<Vec<PathBuf>> {
        let backups = self.backups.clone();
        Ok(run_blocking(move || backups.list()).await?)
    }

    /// Exclude other runs in this service, then other services and processes
    /// sharing the backup directory.
    pub(crate) async fn lock_maintenance(&self) -> LeaderboardResult<MaintenanceGuard<'_>> {
        let local = self
            .maintenance
            .try_lock()
            .map_err(|_| LeaderboardError::CompactionInProgress)?;

        let backups = self.backups.clone();
        match run_blocking(move || backups.try_lock()).await? {
            Some(file) => Ok(MaintenanceGuard {
                _local: local,
                _file: file,
            }),
            None => {
                info!(dir = %self.backups.root().display(), "maintenance lock held elsewhere");
                Err(LeaderboardError::CompactionInProgress)
            }
        }
    }

    async fn snapshot(
        &self,
        started_at: DateTime<Utc>,
        records: Vec<ScoreRecord>,
    ) -> Result<BackupArtifact, BackupError> {
        let backups = self.backups.clone();
        run_blocking(move || backups.write_snapshot(started_at, &records)).await
    }
}

async fn run_blocking<T, F>(op: F) -> Result<T, BackupError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, BackupError> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| BackupError::Io(io::Error::other(e.to_string())))?
}
