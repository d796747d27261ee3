//! REST API endpoints.
//!
//! Axum-based HTTP API serving roster statistics to the static
//! front end, which is served from the same router.

use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::analysis::summary::{present, StatsSummary};
use crate::cache::Reconciliation;

pub mod state;

pub use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// One player's entry in the response. `warning` is set when the stats
/// come from the cache because the source could not be fully reached.
#[derive(Debug, Serialize)]
pub struct PlayerStats {
    #[serde(flatten)]
    pub summary: StatsSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<&Reconciliation> for PlayerStats {
    fn from(reconciliation: &Reconciliation) -> Self {
        PlayerStats {
            summary: present(&reconciliation.aggregate),
            warning: reconciliation.warning_message(),
        }
    }
}

pub fn build_router(state: AppState, public_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .route("/api/players", get(list_players))
        .route("/api/players/:player_id", get(get_player));

    let router = match public_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

pub async fn list_players(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlayerStats>>, ApiError> {
    info!("Incoming request for {} players", state.roster.roster().len());

    state
        .roster
        .reconcile_all()
        .await
        .into_iter()
        .map(|result| match result {
            Ok(reconciliation) => Ok(PlayerStats::from(&reconciliation)),
            Err(e) => {
                error!("Reconciliation failed: {}", e);
                Err(ApiError::Internal(e.to_string()))
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Json)
}

pub async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerStats>, ApiError> {
    if !state.roster.contains(&player_id) {
        return Err(ApiError::NotFound(format!("Player {} is not tracked", player_id)));
    }

    let reconciliation = state.roster.reconcile_one(&player_id).await.map_err(|e| {
        error!("Reconciliation of {} failed: {}", player_id, e);
        ApiError::Internal(e.to_string())
    })?;

    Ok(Json(PlayerStats::from(&reconciliation)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::filter::MatchFilter;
    use crate::cache::{AggregateCache, CacheSettings};
    use crate::roster::RosterReconciler;
    use crate::source::testing::{gold_two, ranked_match, MockSource};
    use crate::store::AggregateStore;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn setup_test_state(dir: &std::path::Path, source: Arc<MockSource>) -> AppState {
        let settings = CacheSettings {
            filter: MatchFilter::new([420, 440], Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap(), 300),
            match_history_limit: 1000,
            refresh_interval: Duration::ZERO,
        };
        let cache = AggregateCache::new(source, settings, AggregateStore::open(dir.join("aggregates.json")));
        AppState {
            roster: Arc::new(RosterReconciler::new(
                Arc::new(cache),
                vec!["p1".to_string(), "p2".to_string()],
                4,
            )),
        }
    }

    fn seeded_source() -> Arc<MockSource> {
        let source = Arc::new(MockSource::new());
        source.push_match("p1", ranked_match("NA1_1", "p1", "Ahri", true));
        source.push_match("p1", ranked_match("NA1_2", "p1", "Ahri", false));
        source.push_match("p1", ranked_match("NA1_3", "p1", "Zed", false));
        source.set_standing(Some(gold_two()));
        source
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_list_players_in_roster_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path(), seeded_source()), None);

        let (status, body) = get_json(app, "/api/players").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {
                    "playerId": "p1",
                    "gamesPlayed": 3,
                    "winrate": "33.3%",
                    "mostPlayedChampion": "Ahri",
                    "rank": "GOLD II (45 LP)"
                },
                {
                    "playerId": "p2",
                    "gamesPlayed": 0,
                    "winrate": "N/A",
                    "mostPlayedChampion": "N/A",
                    "rank": "Unranked"
                }
            ])
        );
    }

    #[tokio::test]
    async fn test_source_outage_degrades_per_player() {
        let dir = tempfile::tempdir().unwrap();
        let source = seeded_source();
        let state = setup_test_state(dir.path(), source.clone());
        build_router(state.clone(), None)
            .oneshot(Request::builder().uri("/api/players").body(Body::empty()).unwrap())
            .await
            .unwrap();

        source.set_listing_down(true);
        let (status, body) = get_json(build_router(state, None), "/api/players").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["gamesPlayed"], 3);
        assert!(body[0]["warning"].as_str().unwrap().contains("unavailable"));
        assert!(body[1]["warning"].is_string());
    }

    #[tokio::test]
    async fn test_single_player() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path(), seeded_source()), None);

        let (status, body) = get_json(app, "/api/players/p1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gamesPlayed"], 3);
        assert!(body.get("warning").is_none());
    }

    #[tokio::test]
    async fn test_untracked_player_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path(), seeded_source()), None);

        let (status, body) = get_json(app, "/api/players/stranger").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_static_front_end_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir_all(&public).unwrap();
        std::fs::write(public.join("index.html"), "<h1>Roster</h1>").unwrap();
        let app = build_router(setup_test_state(dir.path(), seeded_source()), Some(public));

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>Roster</h1>");
    }

    #[test]
    fn test_api_error_status() {
        let resp = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
