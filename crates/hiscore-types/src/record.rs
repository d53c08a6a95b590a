use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::name::PlayerName;
use crate::score::Score;

/// A validated submission that has not been written yet.
///
/// The store turns it into a [`ScoreRecord`] by stamping `submitted_at`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewScore {
    pub name: PlayerName,
    pub score: Score,
}

impl NewScore {
    pub fn new(name: PlayerName, score: Score) -> Self {
        Self { name, score }
    }

    /// Stamp this submission with its write time.
    pub fn into_record(self, submitted_at: DateTime<Utc>) -> ScoreRecord {
        ScoreRecord {
            name: self.name,
            score: self.score,
            submitted_at,
        }
    }
}

/// One immutable submission event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub name: PlayerName,
    pub score: Score,
    pub submitted_at: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn to_entry(&self) -> LeaderboardEntry {
        LeaderboardEntry {
            name: self.name.as_str().to_owned(),
            score: self.score.value(),
        }
    }
}

/// One row of the public leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>, score: u64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

impl From<&ScoreRecord> for LeaderboardEntry {
    fn from(record: &ScoreRecord) -> Self {
        record.to_entry()
    }
}

/// Which of a player's records is kept when several share the best score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// The earliest record in storage order wins.
    #[default]
    FirstSubmitted,
    /// The record with the latest `submitted_at` wins; storage order breaks
    /// identical timestamps (later wins).
    LatestSubmitted,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstSubmitted => f.write_str("first-submitted"),
            Self::LatestSubmitted => f.write_str("latest-submitted"),
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-submitted" => Ok(Self::FirstSubmitted),
            "latest-submitted" => Ok(Self::LatestSubmitted),
            other => Err(format!("unknown tie-break rule: {other}")),
        }
    }
}
