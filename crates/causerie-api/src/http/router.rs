//! Axum router configuration with middleware.
//!
//! Routes sit at the root path, matching the paths existing clients call.
//! Middleware: CORS, tracing.

use axum::Router;
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

    Router::new()
        .route(
            "/new_conversation",
            post(handlers::conversation::new_conversation),
        )
        .route("/generate", post(handlers::generate::generate))
        .route(
            "/get_conversation/{id}",
            get(handlers::conversation::get_conversation),
        )
        .route(
            "/list_conversations",
            get(handlers::conversation::list_conversations),
        )
        .route(
            "/update_pre_prompt/{id}",
            post(handlers::conversation::update_pre_prompt),
        )
        .route(
            "/get_pre_prompt/{id}",
            get(handlers::conversation::get_pre_prompt),
        )
        .route(
            "/delete_conversation/{id}",
            delete(handlers::conversation::delete_conversation),
        )
        .route("/reset_db", post(handlers::conversation::reset_db))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
