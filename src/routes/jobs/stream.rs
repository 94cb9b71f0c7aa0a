//! SSE streaming dello stato di un job

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{ErrorResponse, JobRecord, JobState};
use crate::services::JobStore;

use super::JobsState;

/// Cursore sugli snapshot di un singolo job.
///
/// Il canale di broadcast è condiviso da tutti i job: se il ricevitore resta
/// indietro, lo stato viene riletto dalla tabella così un evento terminale
/// perso non lascia lo stream aperto.
struct JobCursor {
    store: Arc<JobStore>,
    job_id: String,
    rx: BroadcastStream<JobRecord>,
    initial: Option<JobRecord>,
    last_state: Option<JobState>,
    terminated: bool,
}

impl JobCursor {
    async fn next_record(&mut self) -> Option<JobRecord> {
        if self.terminated {
            return None;
        }

        let record = match self.initial.take() {
            Some(initial) => initial,
            None => loop {
                match self.rx.next().await {
                    Some(Ok(record)) if record.id == self.job_id => break record,
                    Some(Ok(_)) => continue,
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        tracing::debug!(
                            "Stream job {} in ritardo di {} eventi, rilettura stato",
                            self.job_id,
                            skipped
                        );
                        // Rimosso dalla tabella: niente altro da inviare
                        let snapshot = self.store.get(&self.job_id).await?;
                        if Some(snapshot.state) != self.last_state {
                            break snapshot;
                        }
                    }
                    None => return None,
                }
            },
        };

        self.last_state = Some(record.state);
        self.terminated = record.is_terminal();
        Some(record)
    }
}

/// Snapshot di un job: prima lo stato corrente, poi ogni cambio di stato,
/// fino al primo stato terminale incluso.
pub async fn job_records(
    store: Arc<JobStore>,
    job_id: String,
) -> Result<impl Stream<Item = JobRecord> + Send + 'static> {
    // Subscribe prima di leggere lo snapshot, per non perdere transizioni
    let rx = store.subscribe();
    let initial = store
        .get(&job_id)
        .await
        .ok_or_else(|| AppError::JobNotFound(job_id.clone()))?;

    let cursor = JobCursor {
        store,
        job_id,
        rx: BroadcastStream::new(rx),
        initial: Some(initial),
        last_state: None,
        terminated: false,
    };

    Ok(futures::stream::unfold(cursor, |mut cursor| async move {
        let record = cursor.next_record().await?;
        Some((record, cursor))
    }))
}

fn to_event(record: JobRecord) -> std::result::Result<Event, Infallible> {
    let json = serde_json::to_string(&record).unwrap_or_default();
    Ok(Event::default().event(record.state.to_string()).data(json))
}

/// Stream SSE per seguire lo stato di un job in tempo reale
#[utoipa::path(
    get,
    path = "/status/{job_id}/stream",
    tag = "Jobs",
    params(
        ("job_id" = String, Path, description = "ID del job")
    ),
    responses(
        (status = 200, description = "Stream SSE con gli snapshot del job", body = JobRecord),
        (status = 404, description = "Job non trovato", body = ErrorResponse),
    )
)]
pub async fn job_state_stream(
    State(state): State<JobsState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let records = job_records(state.service.store().clone(), job_id).await?;

    Ok(Sse::new(records.map(to_event)).keep_alive(KeepAlive::default()))
}
