//! Router

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{chat_handler, health_check, resolve_handler, trending_handler};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/resolve", post(resolve_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/trending", get(trending_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
