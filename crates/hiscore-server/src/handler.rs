use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use hiscore_board::{LeaderboardError, LeaderboardService};
use hiscore_types::LeaderboardEntry;

use crate::error::{ServerError, ServerResult};

/// Confirmation body for an accepted submission.
pub const SCORE_ADDED: &str = "Score added!";

#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

/// `POST /scores` body. Fields are loosely typed so that bad values reach
/// validation and get a precise message.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: Value,
}

/// `GET /scores`: the leaderboard.
pub async fn top_scores_handler(
    State(service): State<Arc<LeaderboardService>>,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> ServerResult<Json<Vec<LeaderboardEntry>>> {
    let Query(query) = query.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let limit = query.limit.unwrap_or(service.config().default_limit);
    Ok(Json(service.top_scores(limit).await?))
}

/// `POST /scores`: record one submission.
pub async fn submit_score_handler(
    State(service): State<Arc<LeaderboardService>>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ServerResult<Json<&'static str>> {
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let record = service
        .submit_score(&request.name, &request.score)
        .await
        .inspect_err(|e| {
            if let LeaderboardError::Validation(reason) = e {
                warn!(error = %reason, "submission rejected");
            }
        })?;
    info!(name = %record.name, score = %record.score, "score added");
    Ok(Json(SCORE_ADDED))
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
