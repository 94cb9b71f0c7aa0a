use axum::{extract::State, routing::get, Json, Router};

use crate::models::HealthResponse;
use crate::services::JobService;

#[derive(Clone)]
pub struct HealthState {
    pub service: JobService,
}

pub fn router(service: JobService) -> Router {
    let state = HealthState { service };
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check dell'API
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API funzionante", body = HealthResponse),
    ),
    tag = "Sistema"
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs: state.service.store().len().await,
        workflows: state.service.workflows().names(),
    })
}
