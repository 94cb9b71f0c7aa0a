pub mod health;
pub mod jobs;

use axum::Router;

use crate::services::JobService;

pub fn create_router(service: JobService) -> Router {
    Router::new()
        .merge(health::router(service.clone()))
        .merge(jobs::router(service))
}
