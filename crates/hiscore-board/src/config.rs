use std::path::PathBuf;
use std::time::Duration;

use hiscore_types::TieBreak;
use serde::{Deserialize, Serialize};

/// Policy knobs for the leaderboard service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Entries returned when the caller gives no limit.
    pub default_limit: usize,
    /// Upper bound applied to any requested limit.
    pub max_limit: usize,
    /// Longest accepted player name, in characters.
    pub max_name_chars: usize,
    /// Bound on every individual store call.
    pub store_timeout_ms: u64,
    /// Which record wins among a player's equal best scores.
    pub tie_break: TieBreak,
    /// Where compaction writes its backup artifacts.
    pub backup_dir: PathBuf,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            max_name_chars: 32,
            store_timeout_ms: 5_000,
            tie_break: TieBreak::FirstSubmitted,
            backup_dir: PathBuf::from("backups"),
        }
    }
}

impl LeaderboardConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
