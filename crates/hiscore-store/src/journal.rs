use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use hiscore_types::{NewScore, ScoreRecord};

use crate::error::{StoreError, StoreResult};
use crate::traits::ScoreStore;

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Flush/sync strategy for journal appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` after every append.
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering.
    OsDefault,
}

/// Configuration for the [`JournalScoreStore`].
#[derive(Clone, Debug, Default)]
pub struct JournalConfig {
    pub sync_mode: SyncMode,
}

/// Result of reading the journal front-to-back.
struct Scan {
    records: Vec<ScoreRecord>,
    /// Length of the prefix made of complete frames.
    valid_len: u64,
    file_len: u64,
}

/// File state shared with blocking tasks.
struct Journal {
    path: PathBuf,
    /// Sidecar file carrying the advisory lock. Writers (append, replace)
    /// hold it exclusively, readers shared. The journal itself can't carry
    /// the lock because `replace` renames a new file over it.
    lock_path: PathBuf,
    config: JournalConfig,
    /// End of the last frame this handle wrote, if still known. A journal
    /// whose length differs was touched by someone else and gets rescanned
    /// before the next append.
    tail: Mutex<Option<u64>>,
}

impl Journal {
    fn new(path: PathBuf, config: JournalConfig) -> Self {
        let mut lock_path = OsString::from(path.as_os_str());
        lock_path.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_path),
            config,
            tail: Mutex::new(None),
        }
    }

    fn tail(&self) -> StoreResult<MutexGuard<'_, Option<u64>>> {
        self.tail
            .lock()
            .map_err(|_| StoreError::Unavailable("journal lock poisoned".into()))
    }

    fn lock_file(&self) -> StoreResult<File> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        Ok(file)
    }

    /// Exclusive lock across processes; released when the file is dropped.
    fn lock_exclusive(&self) -> StoreResult<File> {
        let file = self.lock_file()?;
        FileExt::lock_exclusive(&file)?;
        Ok(file)
    }

    fn lock_shared(&self) -> StoreResult<File> {
        let file = self.lock_file()?;
        FileExt::lock_shared(&file)?;
        Ok(file)
    }

    fn append(&self, record: &ScoreRecord) -> StoreResult<()> {
        let mut frame = Vec::new();
        encode_frame(record, &mut frame)?;

        let mut tail = self.tail()?;
        let _lock = self.lock_exclusive()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut start = file.metadata()?.len();
        if *tail != Some(start) {
            start = self.cut_torn_tail(&file)?;
        }

        if let Err(e) = self.write_frame(&mut file, &frame) {
            // Leave no partial frame behind: later appends must start on a
            // frame boundary or every record after them is unreadable.
            *tail = None;
            warn!(
                path = %self.path.display(),
                error = %e,
                len = start,
                "journal append failed; rolling back"
            );
            if let Err(rollback) = file.set_len(start) {
                error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "journal rollback failed; torn tail is cut before the next append"
                );
            }
            return Err(e.into());
        }

        *tail = Some(start + frame.len() as u64);
        debug!(path = %self.path.display(), len = frame.len(), "journal append");
        Ok(())
    }

    fn write_frame(&self, file: &mut File, frame: &[u8]) -> std::io::Result<()> {
        file.write_all(frame)?;
        if matches!(self.config.sync_mode, SyncMode::EveryWrite) {
            file.sync_data()?;
        }
        Ok(())
    }

    /// Drop bytes past the last whole frame. Only called with the exclusive
    /// lock held, so the tail can't be another writer's frame in flight.
    fn cut_torn_tail(&self, file: &File) -> StoreResult<u64> {
        let scan = self.scan_file()?;
        if scan.valid_len < scan.file_len {
            warn!(
                path = %self.path.display(),
                valid_len = scan.valid_len,
                file_len = scan.file_len,
                "truncating torn journal tail"
            );
            file.set_len(scan.valid_len)?;
        }
        Ok(scan.valid_len)
    }

    fn scan(&self) -> StoreResult<Scan> {
        let _lock = self.lock_shared()?;
        self.scan_file()
    }

    fn scan_file(&self) -> StoreResult<Scan> {
        let mut bytes = Vec::new();
        File::open(&self.path)?.read_to_end(&mut bytes)?;
        let (records, valid_len) = decode_frames(&bytes);
        Ok(Scan {
            records,
            valid_len,
            file_len: bytes.len() as u64,
        })
    }

    /// Write the new record set to a staging file next to the journal, sync
    /// it, then rename it over the journal.
    fn replace(&self, records: &[ScoreRecord]) -> StoreResult<()> {
        let mut buf = Vec::new();
        for record in records {
            encode_frame(record, &mut buf)?;
        }

        let mut tail = self.tail()?;
        let _lock = self.lock_exclusive()?;
        *tail = None;
        let mut staging = tempfile::NamedTempFile::new_in(parent_dir(&self.path))?;
        staging.write_all(&buf)?;
        staging.as_file().sync_all()?;
        staging
            .persist(&self.path)
            .map_err(|e| StoreError::Io(e.error))?;
        *tail = Some(buf.len() as u64);

        debug!(path = %self.path.display(), records = records.len(), "journal replaced");
        Ok(())
    }
}

/// Append-only score journal on the local filesystem.
///
/// Each record is serialized with bincode and framed on disk as:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized ScoreRecord)]
/// ```
/// Reads walk the file front-to-back. Frames failing the CRC check are
/// logged and skipped; a frame running past the end of the file is a torn
/// write and ends the scan.
///
/// Opening and reading never modify the file, so a CLI can inspect a journal
/// a running server is writing. A torn tail is cut by the next append, under
/// an exclusive lock on `<journal>.lock` that every writer takes. A failed
/// append truncates its own partial frame before returning the error.
///
/// Appends reopen the file each time, so a journal replaced by another
/// process (e.g. an out-of-band compaction) is picked up by the next append.
pub struct JournalScoreStore {
    inner: Arc<Journal>,
}

impl JournalScoreStore {
    /// Open (or create) the journal at `path`. Existing records are scanned
    /// but the file is left as found.
    pub fn open(path: impl AsRef<Path>, config: JournalConfig) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(parent_dir(&path))?;
        OpenOptions::new().create(true).append(true).open(&path)?;

        let journal = Journal::new(path, config);
        let scan = journal.scan()?;
        if scan.valid_len < scan.file_len {
            info!(
                path = %journal.path.display(),
                torn_bytes = scan.file_len - scan.valid_len,
                "journal has a torn tail; the next append cuts it"
            );
        }
        info!(path = %journal.path.display(), records = scan.records.len(), "score journal opened");

        Ok(Self {
            inner: Arc::new(journal),
        })
    }

    /// Path to the journal file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Run a file operation on tokio's blocking pool.
    async fn blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Journal) -> StoreResult<T> + Send + 'static,
    {
        let journal = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&journal))
            .await
            .map_err(|e| StoreError::Unavailable(format!("journal task failed: {e}")))?
    }
}

#[async_trait]
impl ScoreStore for JournalScoreStore {
    async fn append(&self, score: NewScore) -> StoreResult<ScoreRecord> {
        let record = score.into_record(Utc::now());
        let stored = record.clone();
        self.blocking(move |journal| journal.append(&stored)).await?;
        Ok(record)
    }

    async fn list_all(&self) -> StoreResult<Vec<ScoreRecord>> {
        self.blocking(|journal| journal.scan().map(|scan| scan.records))
            .await
    }

    async fn replace_all(&self, records: Vec<ScoreRecord>) -> StoreResult<()> {
        self.blocking(move |journal| journal.replace(&records)).await
    }
}

impl std::fmt::Debug for JournalScoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalScoreStore")
            .field("path", &self.inner.path)
            .field("sync_mode", &self.inner.config.sync_mode)
            .finish()
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn encode_frame(record: &ScoreRecord, out: &mut Vec<u8>) -> StoreResult<()> {
    let payload =
        bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len()).map_err(|_| {
        StoreError::Serialization(format!("record too large: {} bytes", payload.len()))
    })?;

    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(())
}

/// Decode every intact frame. Returns the records and the byte length of the
/// prefix that consists of whole frames.
fn decode_frames(bytes: &[u8]) -> (Vec<ScoreRecord>, u64) {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset + HEADER_SIZE <= bytes.len() {
        let header = &bytes[offset..offset + HEADER_SIZE];
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let end = offset + HEADER_SIZE + length;
        if length == 0 || end > bytes.len() {
            warn!(offset, length, file_len = bytes.len(), "invalid journal frame; stopping scan");
            break;
        }

        let payload = &bytes[offset + HEADER_SIZE..end];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping record"
            );
        } else {
            match bincode::deserialize::<ScoreRecord>(payload) {
                Ok(record) => records.push(record),
                Err(e) => warn!(offset, error = %e, "undecodable journal record; skipping"),
            }
        }
        offset = end;
    }

    (records, offset as u64)
}
