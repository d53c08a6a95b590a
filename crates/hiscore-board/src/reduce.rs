use std::collections::hash_map::Entry;
use std::collections::HashMap;

use hiscore_types::{LeaderboardEntry, PlayerName, ScoreRecord, TieBreak};

/// Reduce submission history to one best record per player.
///
/// The result holds exactly one record per distinct name: the one with the
/// highest score, with equal maxima resolved by `tie_break`. Records come
/// back ordered by the storage position of the selected record, so the
/// output is deterministic for a given input and feeding it back in yields
/// the same sequence.
pub fn reduce_best(records: Vec<ScoreRecord>, tie_break: TieBreak) -> Vec<ScoreRecord> {
    let mut best: HashMap<PlayerName, (usize, ScoreRecord)> = HashMap::new();

    for (position, record) in records.into_iter().enumerate() {
        match best.entry(record.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert((position, record));
            }
            Entry::Occupied(mut slot) => {
                if supersedes(&record, &slot.get().1, tie_break) {
                    slot.insert((position, record));
                }
            }
        }
    }

    let mut kept: Vec<_> = best.into_values().collect();
    kept.sort_unstable_by_key(|(position, _)| *position);
    kept.into_iter().map(|(_, record)| record).collect()
}

/// Whether `candidate`, stored after `current`, replaces it as the best.
fn supersedes(candidate: &ScoreRecord, current: &ScoreRecord, tie_break: TieBreak) -> bool {
    if candidate.score != current.score {
        return candidate.score > current.score;
    }
    match tie_break {
        TieBreak::FirstSubmitted => false,
        TieBreak::LatestSubmitted => candidate.submitted_at >= current.submitted_at,
    }
}

/// Order reduced records by score, highest first, and keep the top `limit`.
///
/// The sort is stable: players with equal scores keep the order
/// [`reduce_best`] produced.
pub fn rank(mut best: Vec<ScoreRecord>, limit: usize) -> Vec<LeaderboardEntry> {
    best.sort_by(|a, b| b.score.cmp(&a.score));
    best.iter().take(limit).map(LeaderboardEntry::from).collect()
}
