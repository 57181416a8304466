//! Live workflow channel.
//!
//! `GET /api/stream` upgrades to a WebSocket. Inbound messages are
//! `{"mode": "...", "input": {...}}` execution requests; outbound messages
//! are the engine's workflow events plus a terminal result or error frame
//! per request. Events from concurrently running HTTP requests are
//! forwarded too; the broadcast bus is engine-wide.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use cadence_core::{AppState, Mode};

use crate::api::modes::tag_input;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/stream", get(stream_handler))
}

async fn stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    mode: String,
    #[serde(default)]
    input: serde_json::Value,
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut source) = socket.split();
    let mut events = state.events.subscribe();

    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(64);

    // Single writer task: engine events and request results share the sink.
    let event_tx = tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if event_tx.send(text).await.is_err() {
                break;
            }
        }
    });

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = source.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let frame = match handle_request(&state, &text).await {
            Ok(result) => serde_json::json!({ "type": "result", "result": result }),
            Err(error) => serde_json::json!({ "type": "request_error", "error": error }),
        };
        if tx.send(frame.to_string()).await.is_err() {
            break;
        }
    }

    forwarder.abort();
    writer.abort();
}

async fn handle_request(state: &AppState, text: &str) -> Result<serde_json::Value, String> {
    let request: ExecuteRequest =
        serde_json::from_str(text).map_err(|e| format!("malformed request: {}", e))?;
    let mode =
        Mode::from_str(&request.mode).ok_or_else(|| format!("unknown mode '{}'", request.mode))?;
    let input = tag_input(mode, request.input).map_err(|e| e.to_string())?;

    let mut orchestrator = state.orchestrator.lock().await;
    orchestrator
        .execute_mode(mode, input)
        .await
        .map(|output| output.to_value())
        .map_err(|e| e.to_string())
}
