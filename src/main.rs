use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use std::{collections::HashSet, sync::Arc};
use tracing_subscriber::EnvFilter;

use gridcall_scoring::{
    score_event, EventResult, EventScoring, Prediction, ReadinessStatus, ScoringConfig,
    ScoringError,
};

// ---------- Request types ----------

#[derive(Deserialize, Debug)]
struct ScoreRequest {
    event: EventResult,
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize, Debug)]
struct ReadinessQuery {
    race_start: DateTime<Utc>,
    #[serde(default)]
    data_available: bool,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, msg: impl ToString) -> ApiError {
    (status, Json(json!({ "error": msg.to_string() })))
}

fn status_for(e: &ScoringError) -> StatusCode {
    match e {
        ScoringError::NotReady { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ScoringError::DataIntegrity(_) | ScoringError::EmptyInput => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ScoringError::Mismatch { .. } => StatusCode::BAD_REQUEST,
        // The server's own config is at fault, not the request.
        ScoringError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------- Server state ----------

#[derive(Clone)]
struct AppState {
    cfg: Arc<ScoringConfig>,
    scored: Arc<RwLock<HashSet<String>>>, // event ids already scored
}

// ---------- Handlers ----------

async fn score(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<EventScoring>, ApiError> {
    let event_id = req.event.event_id.clone();
    if state.scored.read().contains(&event_id) {
        return Err(api_error(StatusCode::CONFLICT, format!("event {} already scored", event_id)));
    }

    let out = score_event(&req.event, &req.predictions, &state.cfg).map_err(|e| {
        tracing::warn!(event = %event_id, retryable = e.is_retryable(), "scoring failed: {}", e);
        api_error(status_for(&e), e)
    })?;

    // A concurrent request may have scored it while we computed.
    if !state.scored.write().insert(event_id.clone()) {
        return Err(api_error(StatusCode::CONFLICT, format!("event {} already scored", event_id)));
    }
    Ok(Json(out))
}

async fn readiness(Query(q): Query<ReadinessQuery>) -> Json<ReadinessStatus> {
    Json(ReadinessStatus::evaluate(q.race_start, Utc::now(), q.data_available))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = ScoringConfig::from_env()?;
    let port: u16 = std::env::var("PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8080);
    tracing::info!(
        classification_size = cfg.classification_size,
        "loaded scoring config; weights: {:?}",
        cfg.weights
    );

    let state = AppState {
        cfg: Arc::new(cfg),
        scored: Arc::new(RwLock::new(HashSet::new())),
    };

    let app = axum::Router::new()
        .route("/events/score", post(score))
        .route("/readiness", get(readiness))
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState {
            cfg: Arc::new(ScoringConfig::default()),
            scored: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    fn request(results_processed: bool) -> ScoreRequest {
        serde_json::from_value(json!({
            "event": {
                "event_id": "2024-r07-imola",
                "results_processed": results_processed,
                "pole_driver": "VER",
                "podium": ["VER", "NOR", "LEC"],
                "grid_to_finish": { "NOR": 1, "LEC": 1, "PIA": -2 },
                "qualifying_order": ["VER", "PIA", "NOR", "LEC"],
                "race_finish_order": ["VER", "NOR", "LEC", "PIA"],
                "team_of": { "VER": "RBR", "PIA": "MCL", "NOR": "MCL", "LEC": "FER" }
            },
            "predictions": [{
                "user_id": "u1",
                "event_id": "2024-r07-imola",
                "pole_driver": "VER",
                "podium_p1": "VER",
                "podium_p2": "NOR",
                "podium_p3": "LEC",
                "breakout_pick": { "kind": "driver", "id": "NOR" },
                "bust_pick": { "kind": "driver", "id": "PIA" }
            }]
        }))
        .expect("Should deserialize score request")
    }

    #[test]
    fn test_status_for() {
        let not_ready = ScoringError::NotReady { event_id: "e".to_string() };
        assert_eq!(status_for(&not_ready), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_for(&ScoringError::DataIntegrity("dup".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_for(&ScoringError::EmptyInput), StatusCode::UNPROCESSABLE_ENTITY);
        let mismatch = ScoringError::Mismatch {
            input: "prediction",
            found: "a".to_string(),
            expected: "b".to_string(),
        };
        assert_eq!(status_for(&mismatch), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&ScoringError::InvalidConfig("clip".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_body() {
        let (status, Json(body)) = api_error(StatusCode::CONFLICT, "already scored");
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "error": "already scored" }));
    }

    #[tokio::test]
    async fn test_second_score_is_conflict() {
        let state = state();

        let Json(out) = score(State(state.clone()), Json(request(true))).await.unwrap();
        assert_eq!(out.event_id, "2024-r07-imola");
        assert_eq!(out.awards.len(), 1);
        assert!(state.scored.read().contains("2024-r07-imola"));

        let (status, Json(body)) = score(State(state.clone()), Json(request(true)))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "event 2024-r07-imola already scored");
    }

    #[tokio::test]
    async fn test_failed_scoring_does_not_mark_event() {
        let state = state();

        let (status, Json(body)) = score(State(state.clone()), Json(request(false)))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("not finalized"));
        assert!(state.scored.read().is_empty());

        // Once results are final the same event scores normally.
        let Json(out) = score(State(state.clone()), Json(request(true))).await.unwrap();
        assert_eq!(out.summary.predictions_scored, 1);
        assert!(state.scored.read().contains("2024-r07-imola"));
    }

    #[tokio::test]
    async fn test_bad_config_is_server_error() {
        let mut cfg = ScoringConfig::default();
        cfg.positions_gained_clip = 0;
        let state = AppState { cfg: Arc::new(cfg), ..state() };

        let (status, Json(body)) = score(State(state.clone()), Json(request(true)))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("invalid scoring config"));
        assert!(state.scored.read().is_empty());
    }
}
