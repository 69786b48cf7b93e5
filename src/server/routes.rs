//! Axum route handlers for the agent control surface.
//!
//! # Routes
//!
//! - `GET  /health`             — Returns `{"status": "ok", "version": ...}`
//! - `GET  /api/agent/status`   — Current [`StatusSnapshot`]
//! - `POST /api/agent/start`    — Begin the tick schedule
//! - `POST /api/agent/stop`     — Stop scheduling ticks
//! - `POST /api/agent/trigger`  — Inject a trend: `{"trend": "..."}`
//! - `POST /api/agent/focus`    — Switch persona: `{"influencer_id": 2}`

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::{AgentController, StatusSnapshot};
use crate::persona::PersonaId;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<AgentController>,
}

impl AppState {
    pub fn new(controller: Arc<AgentController>) -> Self {
        Self { controller }
    }
}

/// Body of `POST /api/agent/trigger`.
#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    pub trend: String,
}

/// Body of `POST /api/agent/focus`.
#[derive(Debug, Deserialize)]
pub struct FocusRequest {
    pub influencer_id: PersonaId,
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/agent/status", get(status_handler))
        .route("/api/agent/start", post(start_handler))
        .route("/api/agent/stop", post(stop_handler))
        .route("/api/agent/trigger", post(trigger_handler))
        .route("/api/agent/focus", post(focus_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health — liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "influencer-agent",
    }))
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.controller.status())
}

async fn start_handler(State(state): State<AppState>) -> Json<Value> {
    let status = if state.controller.start() {
        "started"
    } else {
        "already_running"
    };
    Json(json!({ "status": status }))
}

async fn stop_handler(State(state): State<AppState>) -> Json<Value> {
    state.controller.stop();
    Json(json!({ "status": "stopped" }))
}

/// POST /api/agent/trigger — queue a trend for the next decide phase.
///
/// A blank trend is rejected with 400 and nothing is queued.
async fn trigger_handler(
    State(state): State<AppState>,
    Json(request): Json<TriggerRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let trend = request.trend.trim();
    if trend.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "trend must not be empty" })),
        ));
    }

    info!(trend, "Trend injected via API");
    state.controller.inject_trend(trend);
    Ok(Json(json!({ "status": "trend_injected", "trend": trend })))
}

/// POST /api/agent/focus — act on another persona from the next tick.
async fn focus_handler(
    State(state): State<AppState>,
    Json(request): Json<FocusRequest>,
) -> Json<Value> {
    state.controller.set_focus(request.influencer_id);
    Json(json!({
        "status": "focus_updated",
        "influencer_id": request.influencer_id,
    }))
}
