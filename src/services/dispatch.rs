//! Dispatch dei job verso i processori esterni

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};

use super::store::{JobStore, Transition};

/// Messaggio registrato sul job quando il dispatch fallisce
pub const DISPATCH_FAILURE_MESSAGE: &str = "Dispatch to workflow processor failed";

/// Lavoro da consegnare al processore
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub job_id: String,
    pub endpoint: String,
    pub callback_url: String,
    pub payload: Map<String, Value>,
}

impl DispatchRequest {
    /// Corpo JSON inviato: campi del payload più `jobId` e `callbackUrl`
    pub fn body(&self) -> Value {
        let mut body = self.payload.clone();
        body.insert("jobId".to_string(), Value::String(self.job_id.clone()));
        body.insert(
            "callbackUrl".to_string(),
            Value::String(self.callback_url.clone()),
        );
        Value::Object(body)
    }
}

/// Destinazione del dispatch (processore esterno)
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, request: DispatchRequest) -> BoxFuture<'static, Result<()>>;
}

/// Dispatcher HTTP: POST JSON all'endpoint del workflow
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
}

impl HttpDispatcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Errore creazione client dispatch: {}", e)))?;

        Ok(Self { client })
    }
}

impl Dispatcher for HttpDispatcher {
    fn dispatch(&self, request: DispatchRequest) -> BoxFuture<'static, Result<()>> {
        let client = self.client.clone();

        Box::pin(async move {
            let response = client
                .post(&request.endpoint)
                .json(&request.body())
                .send()
                .await
                .map_err(|e| AppError::Dispatch(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Dispatch(format!(
                    "{} ha risposto {}: {}",
                    request.endpoint, status, body
                )));
            }

            Ok(())
        })
    }
}

/// Esegue il dispatch in un task separato.
///
/// L'unico effetto di un fallimento è il passaggio del job a `Failed`.
pub fn spawn_dispatch(
    store: Arc<JobStore>,
    dispatcher: Arc<dyn Dispatcher>,
    request: DispatchRequest,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let job_id = request.job_id.clone();
        let endpoint = request.endpoint.clone();

        match dispatcher.dispatch(request).await {
            Ok(()) => {
                tracing::info!("Job {} inviato al processore {}", job_id, endpoint);
            }
            Err(e) => {
                tracing::error!("Dispatch del job {} verso {} fallito: {}", job_id, endpoint, e);

                match store.set_failed(&job_id, DISPATCH_FAILURE_MESSAGE).await {
                    Ok(Transition::Applied) => {}
                    Ok(Transition::Ignored(state)) => {
                        tracing::debug!(
                            "Job {} già {} prima dell'errore di dispatch",
                            job_id,
                            state
                        );
                    }
                    Err(e) => tracing::warn!("Impossibile marcare job {} come fallito: {}", job_id, e),
                }
            }
        }
    })
}
