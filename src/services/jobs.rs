//! Submit, callback e polling dei job di generazione

use std::sync::Arc;

use serde_json::Value;

use crate::config::{self, WorkflowRoutes};
use crate::error::{AppError, Result};
use crate::models::{CallbackPayload, GenerateRequest, JobRecord, JobState};

use super::dispatch::{spawn_dispatch, DispatchRequest, Dispatcher};
use super::ids::IdGenerator;
use super::store::{JobStore, Transition};

/// Esito dell'elaborazione di una callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Completed { results: usize },
    Failed,
    /// Il job era già in stato terminale
    Ignored(JobState),
    UnknownJob,
}

#[derive(Clone)]
pub struct JobService {
    store: Arc<JobStore>,
    dispatcher: Arc<dyn Dispatcher>,
    ids: Arc<dyn IdGenerator>,
    workflows: WorkflowRoutes,
    public_url: String,
}

impl std::fmt::Debug for JobService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobService")
            .field("workflows", &self.workflows)
            .field("public_url", &self.public_url)
            .finish()
    }
}

impl JobService {
    pub fn new(
        store: Arc<JobStore>,
        dispatcher: Arc<dyn Dispatcher>,
        ids: Arc<dyn IdGenerator>,
        workflows: WorkflowRoutes,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            ids,
            workflows,
            public_url: public_url.into(),
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn workflows(&self) -> &WorkflowRoutes {
        &self.workflows
    }

    /// Registra un nuovo job e avvia il dispatch senza attenderlo.
    ///
    /// Il record `Pending` esiste già quando l'ID viene restituito.
    pub async fn submit(&self, request: GenerateRequest) -> Result<String> {
        let endpoint = self
            .workflows
            .resolve(&request.workflow)
            .ok_or_else(|| AppError::InvalidWorkflow(request.workflow.clone()))?
            .to_string();

        let job_id = self.ids.next_id();
        self.store.create(&job_id).await?;

        tracing::info!(
            "Job {} creato (workflow {}, endpoint {})",
            job_id,
            request.workflow,
            endpoint
        );

        let dispatch = DispatchRequest {
            callback_url: config::callback_url(&self.public_url, &job_id),
            job_id: job_id.clone(),
            endpoint,
            payload: request.payload,
        };
        spawn_dispatch(self.store.clone(), self.dispatcher.clone(), dispatch);

        Ok(job_id)
    }

    /// Applica il risultato riportato dal processore.
    ///
    /// Non fallisce mai: ID sconosciuti e risultati malformati vengono
    /// solo registrati nei log.
    pub async fn complete(&self, job_id: &str, payload: CallbackPayload) -> CallbackOutcome {
        let (transition, outcome) = match payload.error_message() {
            Some(error) => {
                tracing::warn!("Job {} fallito lato processore: {}", job_id, error);
                (
                    self.store.set_failed(job_id, error).await,
                    CallbackOutcome::Failed,
                )
            }
            None => {
                let urls = normalize_result_urls(payload.image_urls).unwrap_or_else(|e| {
                    tracing::warn!("Job {}: {}, risultato vuoto", job_id, e);
                    Vec::new()
                });
                let results = urls.len();
                (
                    self.store
                        .set_completed(job_id, urls, payload.final_prompt)
                        .await,
                    CallbackOutcome::Completed { results },
                )
            }
        };

        match transition {
            Ok(Transition::Applied) => {
                tracing::info!("Job {} terminato: {:?}", job_id, outcome);
                outcome
            }
            Ok(Transition::Ignored(state)) => {
                tracing::info!(
                    "Callback per job {} ignorata: già in stato {}",
                    job_id,
                    state
                );
                CallbackOutcome::Ignored(state)
            }
            Err(e) => {
                tracing::warn!("Callback per job sconosciuto {}: {}", job_id, e);
                CallbackOutcome::UnknownJob
            }
        }
    }

    pub async fn status(&self, job_id: &str) -> Result<JobRecord> {
        self.store
            .get(job_id)
            .await
            .ok_or_else(|| AppError::JobNotFound(job_id.to_string()))
    }
}

/// Normalizza il campo URL della callback in una lista.
///
/// Accetta un array JSON di stringhe oppure lo stesso array codificato come
/// stringa. Un campo assente vale come lista vuota.
pub fn normalize_result_urls(raw: Option<Value>) -> Result<Vec<String>> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(encoded)) => serde_json::from_str::<Vec<String>>(&encoded)
            .map_err(|e| AppError::MalformedResult(format!("stringa non decodificabile ({})", e))),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(url) => Ok(url),
                other => Err(AppError::MalformedResult(format!(
                    "elemento non stringa: {}",
                    other
                ))),
            })
            .collect(),
        Some(other) => Err(AppError::MalformedResult(format!(
            "tipo inatteso: {}",
            other
        ))),
    }
}
