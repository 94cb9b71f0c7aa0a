//! Tabella dei job in memoria
//!
//! Unica fonte di verità sullo stato dei job. Ogni mutazione avviene sotto
//! lock in scrittura e sostituisce il record per intero, quindi un lettore
//! non osserva mai `state`, `result` ed `error` aggiornati a metà.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use crate::error::{AppError, Result};
use crate::models::{JobRecord, JobState};

/// Capacità del broadcast channel per i cambi di stato
const UPDATES_CHANNEL_CAPACITY: usize = 100;

pub type SharedJobStore = Arc<JobStore>;

/// Esito di una scrittura terminale.
///
/// La prima scrittura terminale vince: le successive vengono ignorate e
/// riportano lo stato già raggiunto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored(JobState),
}

pub struct JobStore {
    jobs: RwLock<HashMap<String, JobRecord>>,
    updates_tx: broadcast::Sender<JobRecord>,
}

impl std::fmt::Debug for JobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobStore")
            .field("receivers", &self.updates_tx.receiver_count())
            .finish()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    pub fn new() -> Self {
        let (updates_tx, _) = broadcast::channel(UPDATES_CHANNEL_CAPACITY);
        Self {
            jobs: RwLock::new(HashMap::new()),
            updates_tx,
        }
    }

    pub fn shared() -> SharedJobStore {
        Arc::new(Self::new())
    }

    /// Inserisce un nuovo job in stato `Pending`
    pub async fn create(&self, id: &str) -> Result<JobRecord> {
        let record = {
            let mut jobs = self.jobs.write().await;
            if jobs.contains_key(id) {
                return Err(AppError::DuplicateJobId(id.to_string()));
            }
            let record = JobRecord::new(id);
            jobs.insert(id.to_string(), record.clone());
            record
        };

        self.publish(&record);
        Ok(record)
    }

    /// Snapshot del job corrente
    pub async fn get(&self, id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(id).cloned()
    }

    pub async fn set_completed(
        &self,
        id: &str,
        result: Vec<String>,
        final_prompt: Option<Value>,
    ) -> Result<Transition> {
        self.transition(id, |job| job.mark_completed(result, final_prompt))
            .await
    }

    pub async fn set_failed(&self, id: &str, error: impl Into<String>) -> Result<Transition> {
        let error = error.into();
        self.transition(id, |job| job.mark_failed(error)).await
    }

    async fn transition<F>(&self, id: &str, apply: F) -> Result<Transition>
    where
        F: FnOnce(&mut JobRecord),
    {
        let updated = {
            let mut jobs = self.jobs.write().await;
            let job = jobs
                .get_mut(id)
                .ok_or_else(|| AppError::JobNotFound(id.to_string()))?;

            if job.is_terminal() {
                tracing::debug!(
                    "Job {} già in stato terminale ({}), scrittura ignorata",
                    id,
                    job.state
                );
                return Ok(Transition::Ignored(job.state));
            }

            apply(job);
            job.clone()
        };

        self.publish(&updated);
        Ok(Transition::Applied)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Ricevitore per gli snapshot pubblicati ad ogni cambio di stato
    pub fn subscribe(&self) -> broadcast::Receiver<JobRecord> {
        self.updates_tx.subscribe()
    }

    /// Rimuove i job terminati prima di `cutoff`. I job `Pending` restano.
    pub async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.completed_at {
            Some(done) if job.is_terminal() => done >= cutoff,
            _ => true,
        });
        before - jobs.len()
    }

    /// Rimuove i job terminati da più di `retention`.
    ///
    /// Una finestra oltre il range delle date non rimuove nulla.
    pub async fn evict_older_than(&self, retention: TimeDelta) -> usize {
        match Utc::now().checked_sub_signed(retention) {
            Some(cutoff) => self.evict_finished_before(cutoff).await,
            None => 0,
        }
    }

    fn publish(&self, record: &JobRecord) {
        // Ignora errore se nessun receiver (nessun client connesso)
        let _ = self.updates_tx.send(record.clone());
    }
}
