//! Callback dei processori esterni

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};

use crate::models::CallbackPayload;

use super::JobsState;

/// Riceve l'esito di un job dal processore.
///
/// Risponde sempre 200, anche per job sconosciuti o risultati malformati.
#[utoipa::path(
    post,
    path = "/callback/{job_id}",
    tag = "Jobs",
    request_body(
        content = Object,
        content_type = "application/json",
        description = "`imageUrls` (lista o lista codificata come stringa), `finalPrompt`, `error`"
    ),
    params(
        ("job_id" = String, Path, description = "ID del job")
    ),
    responses(
        (status = 200, description = "Callback ricevuta", body = String),
    )
)]
pub async fn job_callback(
    State(state): State<JobsState>,
    Path(job_id): Path<String>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let payload = CallbackPayload::from_body(&body);
    let outcome = state.service.complete(&job_id, payload).await;
    tracing::debug!("Callback job {}: {:?}", job_id, outcome);

    (StatusCode::OK, "OK")
}
