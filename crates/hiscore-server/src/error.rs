use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;
use tracing::error;

use hiscore_board::LeaderboardError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),

    #[error("store error: {0}")]
    Store(#[from] hiscore_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Status code and the message safe to show a client.
    fn public_parts(&self) -> (StatusCode, String) {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Leaderboard(LeaderboardError::Validation(e)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            Self::Leaderboard(LeaderboardError::StoreUnavailable(_)) | Self::Store(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "leaderboard temporarily unavailable, try again".into(),
            ),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".into()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = self.public_parts();
        if status.is_server_error() {
            error!(error = %self, %status, "request failed");
        }
        (status, Json(message)).into_response()
    }
}
