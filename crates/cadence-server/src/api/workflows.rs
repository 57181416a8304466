//! Macro workflow endpoints: full, rapid, express.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::Deserialize;

use cadence_core::{AppState, EngineError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/full", post(run_full))
        .route("/rapid", post(run_rapid))
        .route("/express", post(run_express))
}

#[derive(Debug, Deserialize)]
struct WorkflowRequest {
    prompt: String,
}

async fn run_full(
    State(state): State<AppState>,
    Json(body): Json<WorkflowRequest>,
) -> Result<Json<serde_json::Value>, EngineError> {
    let mut orchestrator = state.orchestrator.lock().await;
    let output = orchestrator.full_lifecycle(&body.prompt).await?;
    Ok(Json(envelope("full", output.to_value())))
}

async fn run_rapid(
    State(state): State<AppState>,
    Json(body): Json<WorkflowRequest>,
) -> Result<Json<serde_json::Value>, EngineError> {
    let mut orchestrator = state.orchestrator.lock().await;
    let output = orchestrator.rapid(&body.prompt).await?;
    Ok(Json(envelope("rapid", output.to_value())))
}

async fn run_express(
    State(state): State<AppState>,
    Json(body): Json<WorkflowRequest>,
) -> Result<Json<serde_json::Value>, EngineError> {
    let mut orchestrator = state.orchestrator.lock().await;
    let output = orchestrator.express(&body.prompt).await?;
    Ok(Json(envelope("express", output.to_value())))
}

fn envelope(workflow: &str, result: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "workflow": workflow,
        "result": result,
        "timestamp": Utc::now(),
    })
}
