use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{ai, handlers, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/code/run", post(handlers::run_code))
        .route("/api/submit_code", post(handlers::submit_code))
        .route("/api/azure_token", get(handlers::azure_token))
        .route("/api/ai/analyze", post(ai::analyze))
        .route("/api/ai/update_context", post(ai::update_context))
        .route("/api/ai/analyze_context", post(ai::analyze_context))
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
}

/// CORS for the frontend; `*` allows any origin
pub fn cors(frontend_origin: &str) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if frontend_origin.trim() == "*" {
        return Ok(layer.allow_origin(Any));
    }
    let origin = HeaderValue::from_str(frontend_origin.trim())
        .map_err(|e| anyhow::anyhow!("invalid FRONTEND_ORIGIN '{}': {}", frontend_origin, e))?;
    Ok(layer.allow_origin(origin))
}
