//! Job routes module
//!
//! Submit, callback dal processore, polling dello stato e stream SSE.

mod callback;
mod status;
mod stream;
mod submit;

use axum::{
    routing::{get, post},
    Router,
};

use crate::services::JobService;

// Re-export public items (including utoipa path types)
pub use callback::*;
pub use status::*;
pub use stream::*;
pub use submit::*;

/// Shared state for job routes
#[derive(Clone)]
pub struct JobsState {
    pub service: JobService,
}

/// Create the router for job endpoints
pub fn router(service: JobService) -> Router {
    let state = JobsState { service };

    Router::new()
        .route("/generate", post(submit_job))
        .route("/callback/:job_id", post(job_callback))
        .route("/status/:job_id", get(get_job_status))
        .route("/status/:job_id/stream", get(job_state_stream))
        .with_state(state)
}
