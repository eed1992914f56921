//! Job Registry.
//!
//! Jobs live for the lifetime of the process. A job is written twice: once
//! when it is created and once when it reaches a terminal state.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use scenecast_models::{Job, JobId, JobOutcome};

use crate::error::RegistryError;

/// Storage for job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Register a new job in the `processing` state.
    async fn create(&self) -> Job;

    /// Record the terminal outcome of a job. Rejects a second transition.
    async fn transition(&self, id: &JobId, outcome: JobOutcome) -> Result<Job, RegistryError>;

    /// Snapshot of a job, or `None` if the id is unknown.
    async fn get(&self, id: &JobId) -> Option<Job>;
}

/// Process-local [`JobStore`].
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self) -> Job {
        let job = Job::new(JobId::new());
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        debug!(job_id = %job.id, "Job registered");
        job
    }

    async fn transition(&self, id: &JobId, outcome: JobOutcome) -> Result<Job, RegistryError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        if job.is_terminal() {
            return Err(RegistryError::AlreadyTerminal {
                id: id.clone(),
                status: job.status,
            });
        }

        job.finish(outcome);
        debug!(job_id = %id, status = %job.status, "Job finished");
        Ok(job.clone())
    }

    async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }
}
