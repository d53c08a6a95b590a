use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use hiscore_store::{ScoreStore, StoreError, StoreResult};
use hiscore_types::{LeaderboardEntry, NewScore, PlayerName, Score, ScoreRecord, ValidationError};

use crate::backup::BackupDir;
use crate::config::LeaderboardConfig;
use crate::error::{LeaderboardError, LeaderboardResult};
use crate::reduce::{rank, reduce_best};

/// Submission and ranking over a [`ScoreStore`].
///
/// Cheap to share behind an `Arc`; the only internal state besides the store
/// is the in-process half of the maintenance lock. The other half is a file
/// lock in the backup directory, taken by compaction and restore.
pub struct LeaderboardService {
    pub(crate) store: Arc<dyn ScoreStore>,
    pub(crate) config: LeaderboardConfig,
    pub(crate) backups: BackupDir,
    pub(crate) maintenance: Mutex<()>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn ScoreStore>, config: LeaderboardConfig) -> Self {
        let backups = BackupDir::new(config.backup_dir.clone());
        Self {
            store,
            config,
            backups,
            maintenance: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    pub fn backups(&self) -> &BackupDir {
        &self.backups
    }

    /// Validate and record one submission.
    ///
    /// Every valid submission is appended; deduplication happens on read.
    /// Nothing is written when validation fails.
    pub async fn submit_score<S>(&self, name: &str, score: S) -> LeaderboardResult<ScoreRecord>
    where
        S: TryInto<Score, Error = ValidationError>,
    {
        let name = PlayerName::with_max_chars(name, self.config.max_name_chars)?;
        let score = score.try_into()?;

        let record = self
            .bounded("append", self.store.append(NewScore::new(name, score)))
            .await?;
        debug!(name = %record.name, score = %record.score, "score submitted");
        Ok(record)
    }

    /// The `limit` best players, one entry each, highest score first.
    ///
    /// `limit` must be at least 1 and is capped at the configured maximum.
    pub async fn top_scores(&self, limit: usize) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        if limit == 0 {
            return Err(ValidationError::InvalidLimit(limit).into());
        }
        let limit = limit.min(self.config.max_limit);

        let records = self.bounded("list_all", self.store.list_all()).await?;
        let total = records.len();
        let board = rank(reduce_best(records, self.config.tie_break), limit);
        debug!(records = total, entries = board.len(), limit, "leaderboard computed");
        Ok(board)
    }

    /// [`top_scores`](Self::top_scores) with the configured default limit.
    pub async fn leaderboard(&self) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        self.top_scores(self.config.default_limit).await
    }

    /// Number of raw records in the store.
    pub async fn record_count(&self) -> LeaderboardResult<usize> {
        self.bounded("count", self.store.count()).await
    }

    /// Run a store call under the configured timeout; failures of either
    /// kind become `StoreUnavailable`.
    pub(crate) async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> LeaderboardResult<T> {
        self.bounded_raw(op, call).await.map_err(|e| {
            warn!(op, error = %e, "score store call failed");
            LeaderboardError::from(e)
        })
    }

    /// Like [`bounded`](Self::bounded) but keeps the store error, mapping a
    /// timeout to [`StoreError::Unavailable`].
    pub(crate) async fn bounded_raw<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        let timeout = self.config.store_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Unavailable(format!(
                "{op} timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

impl std::fmt::Debug for LeaderboardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaderboardService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hiscore_store::InMemoryScoreStore;
    use serde_json::json;
    use std::time::Duration;

    fn service_with(store: Arc<dyn ScoreStore>) -> LeaderboardService {
        LeaderboardService::new(store, LeaderboardConfig::default())
    }

    fn memory_service() -> (Arc<InMemoryScoreStore>, LeaderboardService) {
        let store = Arc::new(InMemoryScoreStore::new());
        let service = service_with(store.clone());
        (store, service)
    }

    fn entries(pairs: &[(&str, u64)]) -> Vec<LeaderboardEntry> {
        pairs
            .iter()
            .map(|(name, score)| LeaderboardEntry::new(*name, *score))
            .collect()
    }

    /// Store whose every call never completes in time.
    struct StalledStore;

    #[async_trait]
    impl ScoreStore for StalledStore {
        async fn append(&self, _score: NewScore) -> StoreResult<ScoreRecord> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(StoreError::Unavailable("unreachable".into()))
        }

        async fn list_all(&self) -> StoreResult<Vec<ScoreRecord>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }

        async fn replace_all(&self, _records: Vec<ScoreRecord>) -> StoreResult<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    /// Store that is down.
    struct OfflineStore;

    #[async_trait]
    impl ScoreStore for OfflineStore {
        async fn append(&self, _score: NewScore) -> StoreResult<ScoreRecord> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn list_all(&self) -> StoreResult<Vec<ScoreRecord>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn replace_all(&self, _records: Vec<ScoreRecord>) -> StoreResult<()> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn submit_appends_every_score() {
        let (store, service) = memory_service();
        service.submit_score("Alice", 3).await.unwrap();
        service.submit_score("Alice", 3).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn submit_trims_name() {
        let (_, service) = memory_service();
        let record = service.submit_score("  Bob  ", 7u64).await.unwrap();
        assert_eq!(record.name.as_str(), "Bob");
    }

    #[tokio::test]
    async fn invalid_submissions_store_nothing() {
        let (store, service) = memory_service();

        assert!(matches!(
            service.submit_score("", 5).await,
            Err(LeaderboardError::Validation(ValidationError::EmptyName))
        ));
        assert!(matches!(
            service.submit_score("Alice", -1).await,
            Err(LeaderboardError::Validation(ValidationError::NegativeScore(_)))
        ));
        assert!(matches!(
            service.submit_score("Alice", 2.5).await,
            Err(LeaderboardError::Validation(ValidationError::FractionalScore(_)))
        ));
        assert!(matches!(
            service.submit_score("Alice", &json!("ten")).await,
            Err(LeaderboardError::Validation(ValidationError::NotANumber(_)))
        ));
        let long_name = "x".repeat(33);
        assert!(matches!(
            service.submit_score(&long_name, 1).await,
            Err(LeaderboardError::Validation(ValidationError::NameTooLong { .. }))
        ));

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn submit_accepts_json_numbers() {
        let (store, service) = memory_service();
        service.submit_score("Carl", &json!(12)).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Ranking
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn basic_ranking() {
        let (_, service) = memory_service();
        service.submit_score("Alice", 3).await.unwrap();
        service.submit_score("Bob", 7).await.unwrap();
        service.submit_score("Alice", 9).await.unwrap();

        let board = service.top_scores(10).await.unwrap();
        assert_eq!(board, entries(&[("Alice", 9), ("Bob", 7)]));
    }

    #[tokio::test]
    async fn truncation_keeps_ten_highest() {
        let (_, service) = memory_service();
        for i in 1..=15u64 {
            service.submit_score(&format!("player{i}"), i).await.unwrap();
        }

        let board = service.leaderboard().await.unwrap();
        assert_eq!(board.len(), 10);
        let scores: Vec<_> = board.iter().map(|e| e.score).collect();
        assert_eq!(scores, (6..=15).rev().collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn equal_scores_of_different_players_are_not_merged() {
        let (_, service) = memory_service();
        service.submit_score("Carl", 5).await.unwrap();
        service.submit_score("Dana", 5).await.unwrap();

        let board = service.top_scores(10).await.unwrap();
        assert_eq!(board, entries(&[("Carl", 5), ("Dana", 5)]));
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let (_, service) = memory_service();
        for (name, score) in [("Carl", 5), ("Dana", 5), ("Eve", 5), ("Carl", 5)] {
            service.submit_score(name, score).await.unwrap();
        }
        let first = service.top_scores(10).await.unwrap();
        for _ in 0..5 {
            assert_eq!(service.top_scores(10).await.unwrap(), first);
        }
    }

    #[tokio::test]
    async fn zero_limit_is_rejected() {
        let (_, service) = memory_service();
        assert!(matches!(
            service.top_scores(0).await,
            Err(LeaderboardError::Validation(ValidationError::InvalidLimit(0)))
        ));
    }

    #[tokio::test]
    async fn limit_is_capped() {
        let store = Arc::new(InMemoryScoreStore::new());
        let config = LeaderboardConfig {
            max_limit: 3,
            ..LeaderboardConfig::default()
        };
        let service = LeaderboardService::new(store, config);
        for i in 0..5u64 {
            service.submit_score(&format!("p{i}"), i).await.unwrap();
        }
        assert_eq!(service.top_scores(50).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_store_gives_empty_board() {
        let (_, service) = memory_service();
        assert!(service.leaderboard().await.unwrap().is_empty());
        assert_eq!(service.record_count().await.unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Store failures
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn offline_store_is_not_an_empty_board() {
        let service = service_with(Arc::new(OfflineStore));
        assert!(matches!(
            service.top_scores(10).await,
            Err(LeaderboardError::StoreUnavailable(_))
        ));
        assert!(matches!(
            service.submit_score("Alice", 1).await,
            Err(LeaderboardError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn stalled_store_times_out() {
        let config = LeaderboardConfig {
            store_timeout_ms: 50,
            ..LeaderboardConfig::default()
        };
        let service = LeaderboardService::new(Arc::new(StalledStore), config);
        let err = service.top_scores(10).await.unwrap_err();
        match err {
            LeaderboardError::StoreUnavailable(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn concurrent_submissions_all_land() {
        let (store, service) = memory_service();
        let service = Arc::new(service);
        let handles: Vec<_> = (0..20u64)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.submit_score("Alice", i).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(store.len(), 20);
        assert_eq!(
            service.top_scores(10).await.unwrap(),
            entries(&[("Alice", 19)])
        );
    }
}
