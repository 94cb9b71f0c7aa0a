use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Workflow non valido: {0}")]
    InvalidWorkflow(String),

    #[error("Job non trovato: {0}")]
    JobNotFound(String),

    #[error("ID job duplicato: {0}")]
    DuplicateJobId(String),

    #[error("Dispatch fallito: {0}")]
    Dispatch(String),

    #[error("Risultato malformato: {0}")]
    MalformedResult(String),

    #[error("Richiesta non valida: {0}")]
    BadRequest(String),

    #[error("Errore interno: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidWorkflow(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::JobNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MalformedResult(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Dispatch(_) => StatusCode::BAD_GATEWAY,
            AppError::DuplicateJobId(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "message": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
