use async_trait::async_trait;
use hiscore_types::{NewScore, ScoreRecord};

use crate::error::StoreResult;

/// Durable, append-only record of score submissions.
///
/// All implementations must satisfy these invariants:
/// - Records are immutable once written.
/// - `list_all` yields records in the order they were stored.
/// - `replace_all` never leaves the store empty because its insert phase
///   failed after its delete phase: either the new set is fully visible or
///   the old set is still in place.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Persist a validated submission and return the stored record with its
    /// assigned `submitted_at`.
    async fn append(&self, score: NewScore) -> StoreResult<ScoreRecord>;

    /// Every stored record, in storage order.
    async fn list_all(&self) -> StoreResult<Vec<ScoreRecord>>;

    /// Replace the whole record set with `records`, kept in the given order.
    async fn replace_all(&self, records: Vec<ScoreRecord>) -> StoreResult<()>;

    /// Number of stored records.
    ///
    /// Default implementation reads every record. Backends may override.
    async fn count(&self) -> StoreResult<usize> {
        Ok(self.list_all().await?.len())
    }
}
