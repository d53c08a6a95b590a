//! HTTP server for the hiscore leaderboard.
//!
//! | Method | Path      | Purpose                                   |
//! |--------|-----------|-------------------------------------------|
//! | GET    | `/scores` | top scores, one per player (`?limit=N`)   |
//! | POST   | `/scores` | submit `{"name": ..., "score": ...}`      |
//! | GET    | `/health` | liveness                                  |
//!
//! Compaction is deliberately absent: it is an operator task run through
//! the `hiscore` CLI.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::HiscoreServer;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use hiscore_board::{LeaderboardConfig, LeaderboardService};
    use hiscore_store::InMemoryScoreStore;

    fn app() -> Router {
        let service = LeaderboardService::new(
            Arc::new(InMemoryScoreStore::new()),
            LeaderboardConfig::default(),
        );
        router::build_router(Arc::new(service))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, body)
    }

    fn post_score(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/scores")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn empty_leaderboard_is_empty_array() {
        let (status, body) = send(&app(), get("/scores")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn submit_then_read_ranked_scores() {
        let app = app();
        for (name, score) in [("Alice", 3), ("Bob", 7), ("Alice", 9)] {
            let request = post_score(json!({"name": name, "score": score}));
            let (status, body) = send(&app, request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!("Score added!"));
        }

        let (status, body) = send(&app, get("/scores")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{"name": "Alice", "score": 9}, {"name": "Bob", "score": 7}])
        );
    }

    #[tokio::test]
    async fn default_limit_is_ten() {
        let app = app();
        for i in 1..=15 {
            let (status, _) =
                send(&app, post_score(json!({"name": format!("p{i}"), "score": i}))).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = send(&app, get("/scores")).await;
        let scores: Vec<u64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["score"].as_u64().unwrap())
            .collect();
        assert_eq!(scores, (6..=15).rev().collect::<Vec<u64>>());

        let (_, body) = send(&app, get("/scores?limit=3")).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn invalid_submissions_are_bad_requests() {
        let app = app();
        let cases = [
            json!({"name": "", "score": 5}),
            json!({"name": "   ", "score": 5}),
            json!({"name": "Alice", "score": -1}),
            json!({"name": "Alice", "score": 2.5}),
            json!({"name": "Alice", "score": "12"}),
            json!({"name": "Alice"}),
            json!({"score": 4}),
        ];
        for case in cases {
            let (status, body) = send(&app, post_score(case.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "case {case}");
            assert!(body.is_string(), "case {case}");
        }

        let (_, body) = send(&app, get("/scores")).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/scores")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send(&app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn zero_or_garbage_limit_is_bad_request() {
        let app = app();
        let (status, _) = send(&app, get("/scores?limit=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, get("/scores?limit=lots")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn compaction_is_not_routed() {
        let request = Request::builder()
            .method("POST")
            .uri("/compact")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
