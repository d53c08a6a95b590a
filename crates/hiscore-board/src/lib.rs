//! Leaderboard service.
//!
//! Turns the raw submission history held by a
//! [`ScoreStore`](hiscore_store::ScoreStore) into:
//!
//! - a submission operation ([`LeaderboardService::submit_score`]),
//! - a ranked top-N view ([`LeaderboardService::top_scores`]),
//! - an administrative compaction ([`LeaderboardService::compact`]) that
//!   writes a JSON backup artifact and then collapses history to one best
//!   record per player.
//!
//! Ranking and compaction share one reduction ([`reduce_best`]), so the two
//! can never disagree about a player's best score.

pub mod backup;
pub mod compaction;
pub mod config;
pub mod error;
pub mod reduce;
pub mod service;

pub use backup::{BackupArtifact, BackupDir};
pub use compaction::CompactionReport;
pub use config::LeaderboardConfig;
pub use error::{BackupError, LeaderboardError, LeaderboardResult};
pub use reduce::{rank, reduce_best};
pub use service::LeaderboardService;
