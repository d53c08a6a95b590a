//! Foundation types for the hiscore leaderboard.
//!
//! Every value that reaches the score store passes through the validating
//! constructors in this crate, so an invalid record is unrepresentable:
//!
//! - [`PlayerName`] -- trimmed, non-empty display name
//! - [`Score`] -- non-negative integer score
//! - [`NewScore`] -- a validated submission awaiting its timestamp
//! - [`ScoreRecord`] -- one immutable, timestamped submission event
//! - [`LeaderboardEntry`] -- the `{name, score}` pair served to clients
//! - [`TieBreak`] -- which record wins among a player's equal best scores

pub mod error;
pub mod name;
pub mod record;
pub mod score;

pub use error::ValidationError;
pub use name::PlayerName;
pub use record::{LeaderboardEntry, NewScore, ScoreRecord, TieBreak};
pub use score::Score;
