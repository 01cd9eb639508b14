//! HTTP API for health checks and schedule control

use crate::config::ApiConfig;
use crate::error::{ChargerError, ChargerResult};
use crate::scheduler::Scheduler;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

/// Routes without a listener attached
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/start", post(start_schedule))
        .route("/stop", post(stop_schedule))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP API server
pub async fn run_server(config: ApiConfig, scheduler: Arc<Scheduler>) -> ChargerResult<()> {
    let app = router(AppState { scheduler });

    let addr = format!("{}:{}", config.host, config.port);
    info!("Server is running on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ChargerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| ChargerError::Internal(format!("API server: {}", e)))
}

/// Liveness only; independent of the schedule
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "OK" })
}

async fn start_schedule(State(state): State<AppState>) -> impl IntoResponse {
    state.scheduler.start().await;
    Json(MessageResponse {
        message: "Cron job started",
    })
}

async fn stop_schedule(State(state): State<AppState>) -> impl IntoResponse {
    state.scheduler.stop().await;
    Json(MessageResponse {
        message: "Cron job stopped",
    })
}

// Response types

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}
