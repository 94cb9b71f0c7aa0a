use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::models::{ErrorResponse, JobRecord};

use super::JobsState;

/// Ottiene lo stato corrente di un job
#[utoipa::path(
    get,
    path = "/status/{job_id}",
    tag = "Jobs",
    params(
        ("job_id" = String, Path, description = "ID del job")
    ),
    responses(
        (status = 200, description = "Stato del job", body = JobRecord),
        (status = 404, description = "Job non trovato", body = ErrorResponse),
    )
)]
pub async fn get_job_status(
    State(state): State<JobsState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobRecord>> {
    let job = state.service.status(&job_id).await?;
    Ok(Json(job))
}
