use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use tracing::{debug, info};

use hiscore_types::ScoreRecord;

use crate::error::BackupError;

const PREFIX: &str = "scores_backup_";
const EXTENSION: &str = ".json";

/// Advisory lock shared by every process compacting or restoring into this
/// directory.
const LOCK_FILE: &str = ".maintenance.lock";

/// Runs starting in the same millisecond get `_01`..`_99` suffixes.
const MAX_SUFFIX: u32 = 99;

/// A backup written to durable storage and verified by reading it back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupArtifact {
    pub path: PathBuf,
    pub records: usize,
    pub created_at: DateTime<Utc>,
}

/// Directory holding pre-compaction backup artifacts.
///
/// Each artifact is a pretty-printed JSON array of every record in the store,
/// named after the compaction run's start time, e.g.
/// `scores_backup_20240101T120000.000Z.json`. Names sort chronologically.
#[derive(Clone, Debug)]
pub struct BackupDir {
    root: PathBuf,
}

impl BackupDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Take the maintenance lock for this directory without waiting.
    ///
    /// `Ok(None)` means another holder, in this process or another one, has
    /// it. The lock is released when the returned file is dropped.
    pub fn try_lock(&self) -> Result<Option<File>, BackupError> {
        fs::create_dir_all(&self.root)?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.root.join(LOCK_FILE))?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(file)),
            Err(e) if is_contended(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `records` to a new artifact, fsync it, and verify the contents.
    ///
    /// Never overwrites an existing file.
    pub fn write_snapshot(
        &self,
        started_at: DateTime<Utc>,
        records: &[ScoreRecord],
    ) -> Result<BackupArtifact, BackupError> {
        fs::create_dir_all(&self.root)?;
        let (path, file) = self.create_exclusive(started_at)?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);

        let read_back = Self::read(&path)?;
        if read_back.as_slice() != records {
            return Err(BackupError::Verification {
                path,
                expected: records.len(),
                found: read_back.len(),
            });
        }

        info!(path = %path.display(), records = records.len(), "backup written");
        Ok(BackupArtifact {
            path,
            records: records.len(),
            created_at: started_at,
        })
    }

    /// Load the records held by a backup artifact.
    pub fn read(path: &Path) -> Result<Vec<ScoreRecord>, BackupError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Backup artifacts in this directory, newest first.
    ///
    /// A missing directory simply has no backups.
    pub fn list(&self) -> Result<Vec<PathBuf>, BackupError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            if let Some(name) = name.to_str() {
                if name.starts_with(PREFIX) && name.ends_with(EXTENSION) {
                    names.push(name.to_owned());
                }
            }
        }
        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names.into_iter().map(|name| self.root.join(name)).collect())
    }

    fn create_exclusive(&self, started_at: DateTime<Utc>) -> Result<(PathBuf, File), BackupError> {
        let stamp = started_at.format("%Y%m%dT%H%M%S%.3fZ").to_string();

        for attempt in 0..=MAX_SUFFIX {
            let name = if attempt == 0 {
                format!("{PREFIX}{stamp}{EXTENSION}")
            } else {
                format!("{PREFIX}{stamp}_{attempt:02}{EXTENSION}")
            };
            let path = self.root.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "backup name taken");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(BackupError::NameExhausted(stamp))
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
