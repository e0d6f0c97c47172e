//! Axum router configuration with middleware.
//!
//! - `POST /events/{*path}`: the event receiver.
//! - `/api/v1/`: registration admin endpoints.
//! - `GET /health`: liveness plus lookup cache counters.
//!
//! Middleware: CORS, tracing.

use axum::Router;
use axum::extract::State;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/registrations",
            get(handlers::registration::list_registrations)
                .post(handlers::registration::register_trigger),
        )
        .route(
            "/registrations/{*path}",
            get(handlers::registration::get_registration),
        )
        .route(
            "/workflows/{id}/registrations",
            delete(handlers::registration::deregister_workflow),
        );

    Router::new()
        .route("/events/{*path}", post(handlers::event::receive_event))
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let stats = state.cache.stats();
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "cache": {
            "hits": stats.hits(),
            "misses": stats.misses(),
        },
    }))
}
