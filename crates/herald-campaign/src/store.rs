// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide registry of send jobs.
//!
//! Jobs are kept until the process exits so finished campaigns stay
//! queryable. The store is injected where needed; nothing here is global.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use herald_core::SendUnit;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::CampaignError;
use crate::job::{Job, JobId, JobState, Progress};

/// Counts reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub jobs: usize,
    pub running: bool,
}

/// Keyed registry `id -> Job`.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: DashMap<JobId, Arc<Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job with zeroed counters in the running state.
    pub fn create(&self, units: Vec<SendUnit>, delay: Duration) -> Result<Arc<Job>, CampaignError> {
        if units.is_empty() {
            return Err(CampaignError::InvalidJob);
        }
        let id = JobId::generate();
        let job = Arc::new(Job::new(id.clone(), units, delay));
        debug!(job_id = %id, total = job.total(), "job registered");
        self.jobs.insert(id, Arc::clone(&job));
        Ok(job)
    }

    pub fn get(&self, id: &str) -> Result<Arc<Job>, CampaignError> {
        self.jobs
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CampaignError::NotFound { id: id.to_string() })
    }

    /// Apply an atomic transition to a stored job.
    pub fn mutate<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut JobState) -> R,
    ) -> Result<R, CampaignError> {
        self.get(id)?.update(f)
    }

    pub fn pause(&self, id: &str) -> Result<(), CampaignError> {
        if self.get(id)?.pause()? {
            info!(job_id = id, "job paused");
        }
        Ok(())
    }

    pub fn resume(&self, id: &str) -> Result<(), CampaignError> {
        if self.get(id)?.resume()? {
            info!(job_id = id, "job resumed");
        }
        Ok(())
    }

    pub fn cancel(&self, id: &str) -> Result<(), CampaignError> {
        if self.get(id)?.cancel()? {
            info!(job_id = id, "job cancel requested");
        }
        Ok(())
    }

    pub fn progress(&self, id: &str) -> Result<Progress, CampaignError> {
        Ok(self.get(id)?.progress())
    }

    pub fn subscribe(&self, id: &str) -> Result<watch::Receiver<Progress>, CampaignError> {
        Ok(self.get(id)?.subscribe())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            jobs: self.jobs.len(),
            running: self.jobs.iter().any(|entry| entry.value().is_running()),
        }
    }

    /// Cancel every job that is still running. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        // Collect first so no shard lock is held while jobs publish progress.
        let running: Vec<Arc<Job>> = self
            .jobs
            .iter()
            .filter(|entry| entry.value().is_running())
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        running
            .iter()
            .filter(|job| matches!(job.cancel(), Ok(true)))
            .count()
    }
}
