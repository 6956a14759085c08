// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control-plane facade over the job store and engine.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use herald_core::SendUnit;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::engine::SendEngine;
use crate::error::CampaignError;
use crate::job::{JobId, Progress};
use crate::store::{JobStore, StoreSummary};

/// The operations exposed to transports: start, progress, pause, resume,
/// cancel, plus push subscriptions and shutdown support.
#[derive(Clone)]
pub struct CampaignService {
    store: Arc<JobStore>,
    engine: SendEngine,
    /// One watcher per started job; each resolves when its driver exits.
    drivers: Arc<Mutex<JoinSet<()>>>,
}

impl CampaignService {
    pub fn new(store: Arc<JobStore>, engine: SendEngine) -> Self {
        Self {
            store,
            engine,
            drivers: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn engine(&self) -> &SendEngine {
        &self.engine
    }

    /// Create a job and start its driver in the background.
    pub fn start(&self, units: Vec<SendUnit>, delay: Duration) -> Result<JobId, CampaignError> {
        let job = self.store.create(units, delay)?;
        let id = job.id().clone();
        let handle = self.engine.spawn(Arc::clone(&job))?;

        let mut drivers = self.drivers();
        while drivers.try_join_next().is_some() {}
        drivers.spawn(async move {
            let Err(e) = handle.await else { return };
            error!(job_id = %job.id(), error = %e, "job driver task died");
            let stopped = job.update(|s| {
                s.running = false;
                s.last_error = format!("job driver stopped unexpectedly: {e}");
            });
            if let Err(e) = stopped {
                warn!(job_id = %job.id(), error = %e, "could not mark dead job as stopped");
            }
        });

        Ok(id)
    }

    pub fn progress(&self, id: &str) -> Result<Progress, CampaignError> {
        self.store.progress(id)
    }

    pub fn pause(&self, id: &str) -> Result<(), CampaignError> {
        self.store.pause(id)
    }

    pub fn resume(&self, id: &str) -> Result<(), CampaignError> {
        self.store.resume(id)
    }

    pub fn cancel(&self, id: &str) -> Result<(), CampaignError> {
        self.store.cancel(id)
    }

    pub fn subscribe(&self, id: &str) -> Result<watch::Receiver<Progress>, CampaignError> {
        self.store.subscribe(id)
    }

    pub fn summary(&self) -> StoreSummary {
        self.store.summary()
    }

    /// Signal every running job to stop at its next checkpoint.
    pub fn cancel_all(&self) -> usize {
        let cancelled = self.store.cancel_all();
        if cancelled > 0 {
            info!(count = cancelled, "cancelled running jobs");
        }
        cancelled
    }

    /// Cancel every running job and wait up to `grace` for the drivers to
    /// commit their in-flight unit and exit. Returns how many jobs were
    /// cancelled.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let cancelled = self.cancel_all();
        let mut drivers = std::mem::take(&mut *self.drivers());

        let drained = tokio::time::timeout(grace, async {
            while drivers.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(
                remaining = drivers.len(),
                grace_secs = grace.as_secs(),
                "job drivers still busy after shutdown grace period"
            );
        }
        cancelled
    }

    fn drivers(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.drivers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use herald_test_utils::{MockChannel, sample_units};

    use super::*;
    use crate::engine::EngineSettings;
    use crate::job::JobPhase;

    fn service(channel: Arc<MockChannel>) -> CampaignService {
        let engine = SendEngine::new(channel, EngineSettings::default());
        CampaignService::new(Arc::new(JobStore::new()), engine)
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_in_flight_unit() {
        let channel = Arc::new(MockChannel::new().with_latency(Duration::from_secs(5)));
        let service = service(channel.clone());
        let id = service.start(sample_units(3), Duration::ZERO).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let cancelled = service.shutdown(Duration::from_secs(30)).await;

        assert_eq!(cancelled, 1);
        let p = service.progress(id.as_str()).unwrap();
        assert!(!p.running && p.cancelled);
        assert_eq!(p.sent, 1);
        assert_eq!(channel.call_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_gives_up_after_grace() {
        let channel = Arc::new(MockChannel::new().with_latency(Duration::from_secs(120)));
        let service = service(channel);
        let id = service.start(sample_units(1), Duration::ZERO).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let started = tokio::time::Instant::now();
        service.shutdown(Duration::from_secs(10)).await;

        assert!(started.elapsed() < Duration::from_secs(120));
        assert!(service.progress(id.as_str()).unwrap().running);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_with_no_jobs_returns_immediately() {
        let service = service(Arc::new(MockChannel::new()));
        assert_eq!(service.shutdown(Duration::from_secs(30)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_channel_still_reaches_a_terminal_state() {
        let channel = Arc::new(MockChannel::new());
        let units = sample_units(2);
        channel.panic_on(&units[0].destination).await;
        let service = service(channel);

        let id = service.start(units, Duration::from_secs(60)).unwrap();
        let mut rx = service.subscribe(id.as_str()).unwrap();
        let p = rx.wait_for(|p| !p.running).await.unwrap().clone();

        assert_eq!((p.sent, p.failed), (1, 1));
        assert!(p.last_error.contains("channel panicked"));
        assert_eq!(p.state, JobPhase::Done);
        assert!(!service.summary().running);
    }
}
