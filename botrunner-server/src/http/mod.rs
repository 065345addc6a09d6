//! HTTP server module

mod api;
mod forms;
mod notice;
mod pages;
mod static_files;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::ws::events_ws;

pub use api::{
    ApiFailure, HealthResponse, StartRequest, StartResponse, StopResponse,
};
pub use notice::Notice;

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/premium", get(pages::premium))
        .route("/admin", get(pages::admin))
        .route("/start_bot", post(forms::start_bot))
        .route("/stop_bot", post(forms::stop_bot))
        .route("/bot_status", get(api::bot_status))
        .route("/api/bot/status", get(api::bot_status))
        .route("/api/bot/start", post(api::start_bot))
        .route("/api/bot/stop", post(api::stop_bot))
        .route("/api/health", get(api::health))
        .route("/ws/events", get(events_ws))
        .fallback(static_files::static_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
