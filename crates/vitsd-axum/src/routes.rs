//! Route definitions and router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::{AppContext, AppState};

/// Create the control-plane router.
///
/// - `GET /` — liveness ping
/// - `POST /` — raw-text synthesis, WAV bytes out
/// - `POST /synthesize` — phonemized synthesis, JSON out
/// - `GET /set-model` — policy-gated model reload
pub fn create_router(ctx: AppContext) -> Router {
    let state: AppState = Arc::new(ctx);

    Router::new()
        .route("/", get(handlers::ping).post(handlers::synthesize_raw))
        .route("/synthesize", post(handlers::synthesize_json))
        .route("/set-model", get(handlers::set_model))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
