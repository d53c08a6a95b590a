//! Append-only storage for score submissions.
//!
//! The store holds every [`ScoreRecord`](hiscore_types::ScoreRecord) ever
//! submitted, in insertion order. It has no domain logic: ranking and
//! per-player reduction belong to the leaderboard service.
//!
//! # Storage Backends
//!
//! All backends implement the [`ScoreStore`] trait:
//!
//! - [`InMemoryScoreStore`] -- `Vec`-based store for tests and embedding
//! - [`JournalScoreStore`] -- CRC-framed single-file journal on disk
//!
//! # Design Rules
//!
//! 1. Records are immutable once written. There is no update.
//! 2. `list_all` returns records in storage (insertion) order.
//! 3. `replace_all` is atomic from the caller's perspective: readers see
//!    either the old record set or the new one, never an empty store.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod journal;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use journal::{JournalConfig, JournalScoreStore, SyncMode};
pub use memory::InMemoryScoreStore;
pub use traits::ScoreStore;
