//! Single-mode execution endpoints.
//!
//! `POST /api/modes/{mode}` takes the mode's input payload as the request
//! body; the mode tag comes from the path. Success responses wrap the mode
//! output in a `{status, mode, result, timestamp}` envelope.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;

use cadence_core::{AppState, EngineError, Mode, ModeInput};

pub fn router() -> Router<AppState> {
    Router::new().route("/{mode}", post(execute_mode))
}

async fn execute_mode(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, EngineError> {
    let mode = Mode::from_str(&mode)
        .ok_or_else(|| EngineError::NotFound(format!("unknown mode '{}'", mode)))?;
    let input = tag_input(mode, body)?;

    let mut orchestrator = state.orchestrator.lock().await;
    let output = orchestrator.execute_mode(mode, input).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "mode": mode,
        "result": output.to_value(),
        "timestamp": Utc::now(),
    })))
}

/// The path names the mode; stamp the body with the matching tag so the
/// tagged-enum deserialization enforces the right payload shape.
pub fn tag_input(mode: Mode, mut body: serde_json::Value) -> Result<ModeInput, EngineError> {
    let obj = body
        .as_object_mut()
        .ok_or_else(|| EngineError::BadRequest("request body must be a JSON object".into()))?;
    obj.insert("mode".into(), serde_json::json!(mode.as_str()));
    serde_json::from_value(body)
        .map_err(|e| EngineError::BadRequest(format!("invalid {} input: {}", mode, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_input_shapes_payload() {
        let input = tag_input(Mode::Ideate, serde_json::json!({"prompt": "x"})).unwrap();
        assert_eq!(input.mode(), Mode::Ideate);

        // A VALIDATE body without build_output is malformed.
        let err = tag_input(Mode::Validate, serde_json::json!({})).unwrap_err();
        assert!(matches!(err, EngineError::BadRequest(_)));
    }

    #[test]
    fn test_tag_input_rejects_non_object() {
        let err = tag_input(Mode::Ideate, serde_json::json!("just a string")).unwrap_err();
        assert!(matches!(err, EngineError::BadRequest(_)));
    }
}
