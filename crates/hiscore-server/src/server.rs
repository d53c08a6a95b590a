use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use hiscore_board::LeaderboardService;
use hiscore_store::{JournalConfig, JournalScoreStore};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// Leaderboard HTTP server.
pub struct HiscoreServer {
    config: ServerConfig,
    service: Arc<LeaderboardService>,
}

impl HiscoreServer {
    /// Open the score journal named by `config` and wrap it in a service.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let store = JournalScoreStore::open(
            &config.data_path,
            JournalConfig {
                sync_mode: config.sync_mode,
            },
        )?;
        let service = LeaderboardService::new(Arc::new(store), config.leaderboard.clone());
        Ok(Self::with_service(config, Arc::new(service)))
    }

    pub fn with_service(config: ServerConfig, service: Arc<LeaderboardService>) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn service(&self) -> &Arc<LeaderboardService> {
        &self.service
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(Arc::clone(&self.service))
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            addr = %self.config.bind_addr,
            data = %self.config.data_path.display(),
            "hiscore server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
