//! Cadence HTTP server.
//!
//! Puts a REST and WebSocket surface on the cadence-core engine:
//! - POST /api/modes/{mode} to execute a single mode
//! - POST /api/workflows/{full,rapid,express} for the macro workflows
//! - GET  /api/status, /api/history, /api/agents for introspection
//! - GET  /api/stream for live workflow events over WebSocket
//!
//! This crate can be used standalone or embedded (the CLI's `serve`
//! command embeds it).

pub mod api;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cadence_core::agents::ActivationService;
use cadence_core::{
    new_state, AgentRegistry, AppState, EventBus, ModeConfigSet, Orchestrator, PolicyGuard,
    StubModeRunner,
};

/// Configuration for the Cadence backend server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Agent registry file. Built-in roster when unset.
    pub registry_path: Option<PathBuf>,
    /// Directory of per-mode config files. Built-in defaults when unset.
    pub config_dir: Option<PathBuf>,
    /// Policy document for the compliance guard.
    pub policy_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3410,
            registry_path: None,
            config_dir: None,
            policy_path: None,
        }
    }
}

/// Build a shared `AppState` from the server config.
///
/// Useful when the state must be shared between the HTTP server and other
/// consumers (an embedding CLI, tests).
pub fn create_app_state(config: &ServerConfig) -> Result<AppState, String> {
    let registry = match &config.registry_path {
        Some(path) => AgentRegistry::load(path).map_err(|e| e.to_string())?,
        None => AgentRegistry::builtin(),
    };
    let configs = match &config.config_dir {
        Some(dir) => ModeConfigSet::load_dir(dir).map_err(|e| e.to_string())?,
        None => ModeConfigSet::builtin(),
    };
    let guard = PolicyGuard::new(config.policy_path.as_deref());

    let orchestrator = Orchestrator::new(
        configs,
        ActivationService::new(registry),
        guard,
        Box::new(StubModeRunner::new()),
        EventBus::new(),
    );
    Ok(new_state(orchestrator))
}

/// Start the backend server. Returns the actual address it listens on.
pub async fn start_server(config: ServerConfig) -> Result<SocketAddr, String> {
    // try_init: the embedding CLI may have installed a subscriber already.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence_server=info,tower_http=info".into()),
        )
        .try_init();

    tracing::info!(
        "Starting Cadence backend server on {}:{}",
        config.host,
        config.port
    );

    let state = create_app_state(&config)?;
    start_server_with_state(config, state).await
}

/// Start the HTTP server with a pre-built `AppState`.
pub async fn start_server_with_state(
    config: ServerConfig,
    state: AppState,
) -> Result<SocketAddr, String> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(api::api_router())
        .route("/api/health", axum::routing::get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {}", e))?;

    tracing::info!("Cadence backend server listening on {}", local_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(local_addr)
}

/// Liveness of the server process itself, not of any deployed system;
/// the delivery health gate is a separate concern.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "server": "cadence-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
