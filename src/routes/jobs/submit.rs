//! Submit di nuovi job

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::error::{AppError, Result};
use crate::models::{ErrorResponse, GenerateRequest, JobCreatedResponse};

use super::JobsState;

/// Crea un job di generazione e lo inoltra al processore del workflow
#[utoipa::path(
    post,
    path = "/generate",
    tag = "Jobs",
    request_body(
        content = Object,
        content_type = "application/json",
        description = "Campo `workflow` più i parametri da inoltrare al processore"
    ),
    responses(
        (status = 202, description = "Job accettato", body = JobCreatedResponse),
        (status = 400, description = "Workflow sconosciuto o corpo non valido", body = ErrorResponse),
        (status = 500, description = "Errore interno", body = ErrorResponse),
    )
)]
pub async fn submit_job(
    State(state): State<JobsState>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<JobCreatedResponse>)> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let job_id = state.service.submit(request).await?;

    Ok((StatusCode::ACCEPTED, Json(JobCreatedResponse { job_id })))
}
