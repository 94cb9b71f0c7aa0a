use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Stato dell'API
    pub status: String,
    /// Versione dell'API
    pub version: String,
    /// Numero di job presenti in tabella
    pub jobs: usize,
    /// Workflow configurati
    pub workflows: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreatedResponse {
    pub job_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
}
