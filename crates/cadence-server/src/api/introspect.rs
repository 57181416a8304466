//! Read-only engine introspection.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use cadence_core::{AppState, EngineError, Mode};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/history", get(get_history))
        .route("/api/agents", get(get_agents))
}

async fn get_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let orchestrator = state.orchestrator.lock().await;
    Json(orchestrator.status())
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    mode: Option<String>,
}

async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, EngineError> {
    let mode = match query.mode.as_deref() {
        Some(raw) => Some(
            Mode::from_str(raw)
                .ok_or_else(|| EngineError::BadRequest(format!("unknown mode '{}'", raw)))?,
        ),
        None => None,
    };
    let orchestrator = state.orchestrator.lock().await;
    let records: Vec<_> = orchestrator
        .history()
        .iter()
        .filter(|r| mode.map_or(true, |m| r.mode == m))
        .collect();
    Ok(Json(serde_json::json!({ "history": records })))
}

async fn get_agents(State(state): State<AppState>) -> Json<serde_json::Value> {
    let orchestrator = state.orchestrator.lock().await;
    Json(orchestrator.agents().summary())
}
