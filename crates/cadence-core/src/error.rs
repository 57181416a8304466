//! Core error type for the Cadence engine.
//!
//! `EngineError` is used throughout the core domain (mode lifecycle,
//! compliance, gates, orchestration). When the `axum` feature is enabled,
//! it also implements `IntoResponse` so it can be used directly as an axum
//! handler error type.

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A mode's entry requirements were not satisfied by the input.
    #[error("Cannot enter {mode}: {reason}")]
    EntryRequirement { mode: String, reason: String },

    /// A mode's exit criteria were not satisfied by the output.
    /// The active session is left untouched so the caller can retry.
    #[error("Cannot exit {mode}: unmet criteria: {}", unmet.join(", "))]
    ExitCriteria { mode: String, unmet: Vec<String> },

    /// The aggregate compliance verdict came back non-compliant.
    #[error("Compliance violation (score {score:.1}): {}", articles.join(", "))]
    ComplianceViolation { articles: Vec<String>, score: f64 },

    /// One or more delivery gates failed during SHIP.
    #[error("Delivery gates failed: {}", gates.join(", "))]
    GateFailure { gates: Vec<String> },

    /// A single agent failed to activate. Isolated per agent: callers log
    /// it and continue activating the rest of the roster.
    #[error("Agent '{agent}' failed to activate: {reason}")]
    AgentActivation { agent: String, reason: String },

    /// The agent registry file could not be read or parsed. Fatal at
    /// construction time.
    #[error("Registry load error: {0}")]
    RegistryLoad(String),

    /// A mode configuration file could not be read or parsed. Fatal at
    /// construction time.
    #[error("Config load error: {0}")]
    ConfigLoad(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// axum integration (opt-in via feature flag)
// ---------------------------------------------------------------------------

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for EngineError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        // Orchestration failures (compliance, gates, entry/exit criteria)
        // surface as 500-class responses carrying the specific failed
        // article/gate/criterion names in the message.
        let status = match &self {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
