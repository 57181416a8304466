pub mod introspect;
pub mod modes;
pub mod stream;
pub mod workflows;

use axum::Router;

use cadence_core::AppState;

/// Build the complete API router with all sub-routes.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/api/modes", modes::router())
        .nest("/api/workflows", workflows::router())
        .merge(introspect::router())
        .merge(stream::router())
}
