use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use hiscore_board::LeaderboardService;

use crate::handler;

/// Build the axum router with all leaderboard endpoints.
pub fn build_router(service: Arc<LeaderboardService>) -> Router {
    Router::new()
        .route(
            "/scores",
            get(handler::top_scores_handler).post(handler::submit_score_handler),
        )
        .route("/health", get(handler::health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
