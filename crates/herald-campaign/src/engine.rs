// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The send-job engine: one sequential driver loop per job.
//!
//! Each iteration reads a checkpoint from the job (cancelled, paused, next
//! unit, drained), dispatches at most one unit through the channel, commits
//! the outcome, then waits out the inter-unit delay. The delay wait ends early
//! on cancel but not on pause; pause is honoured at the next checkpoint.
//! A channel that panics mid-send costs one failed unit, not the driver.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use herald_config::model::DispatchConfig;
use herald_core::{ChannelAdapter, HeraldError, MessageId, SendUnit};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::CampaignError;
use crate::job::{Checkpoint, Job, Progress};

/// Default interval at which a paused driver re-reads its flags.
pub const DEFAULT_PAUSE_POLL: Duration = Duration::from_millis(300);

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub pause_poll_interval: Duration,
    /// Ask the channel for its session state before the first unit.
    pub require_session: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pause_poll_interval: DEFAULT_PAUSE_POLL,
            require_session: false,
        }
    }
}

impl From<&DispatchConfig> for EngineSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            pause_poll_interval: Duration::from_millis(config.pause_poll_interval_ms),
            require_session: config.require_session,
        }
    }
}

/// Drives jobs through a channel, one unit at a time.
#[derive(Clone)]
pub struct SendEngine {
    channel: Arc<dyn ChannelAdapter>,
    settings: EngineSettings,
}

impl SendEngine {
    pub fn new(channel: Arc<dyn ChannelAdapter>, settings: EngineSettings) -> Self {
        Self { channel, settings }
    }

    pub fn channel(&self) -> &Arc<dyn ChannelAdapter> {
        &self.channel
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Start the driver for `job` on a background task.
    ///
    /// The driver slot is claimed before spawning, so a second call for the
    /// same job fails immediately with [`CampaignError::AlreadyDriven`].
    pub fn spawn(
        &self,
        job: Arc<Job>,
    ) -> Result<JoinHandle<Result<Progress, CampaignError>>, CampaignError> {
        claim(&job)?;
        let engine = self.clone();
        Ok(tokio::spawn(async move { engine.run(&job).await }))
    }

    /// Drive `job` to completion on the current task.
    pub async fn drive(&self, job: &Job) -> Result<Progress, CampaignError> {
        claim(job)?;
        self.run(job).await
    }

    async fn run(&self, job: &Job) -> Result<Progress, CampaignError> {
        let result = self.run_inner(job).await;
        if let Err(e) = &result {
            error!(job_id = %job.id(), error = %e, "job driver stopped on corrupt state");
        }
        result
    }

    async fn run_inner(&self, job: &Job) -> Result<Progress, CampaignError> {
        let total = job.total();
        info!(
            job_id = %job.id(),
            total,
            delay_ms = job.delay().as_millis() as u64,
            channel = self.channel.name(),
            "job started"
        );

        if self.settings.require_session
            && let Err(reason) = self.preflight().await
        {
            error!(job_id = %job.id(), error = %reason, "session check failed, nothing dispatched");
            job.update(|s| {
                s.running = false;
                s.last_error = reason;
            })?;
            return Ok(job.progress());
        }

        loop {
            let cursor = match job.checkpoint() {
                Checkpoint::Cancelled => {
                    job.update(|s| s.running = false)?;
                    let p = job.progress();
                    info!(
                        job_id = %job.id(),
                        sent = p.sent,
                        failed = p.failed,
                        total,
                        "job cancelled"
                    );
                    return Ok(p);
                }
                Checkpoint::Paused => {
                    self.wait_while_paused(job).await;
                    continue;
                }
                Checkpoint::Drained => break,
                Checkpoint::Dispatch(cursor) => cursor,
            };

            let unit = &job.units()[cursor];
            debug!(job_id = %job.id(), cursor, destination = %unit.destination, "dispatching unit");
            let outcome = self.dispatch(unit).await;

            let cursor = job.update(|s| {
                match &outcome {
                    Ok(_) => s.sent += 1,
                    Err(e) => {
                        s.failed += 1;
                        s.last_error = e.to_string();
                    }
                }
                s.cursor += 1;
                s.cursor
            })?;

            if let Err(e) = &outcome {
                warn!(
                    job_id = %job.id(),
                    cursor = cursor - 1,
                    destination = %unit.destination,
                    error = %e,
                    "unit dispatch failed"
                );
            }

            if cursor < total && !job.delay().is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(job.delay()) => {}
                    _ = job.cancellation().cancelled() => {
                        debug!(job_id = %job.id(), "delay cut short by cancel");
                    }
                }
            }
        }

        job.update(|s| s.running = false)?;
        let p = job.progress();
        info!(job_id = %job.id(), sent = p.sent, failed = p.failed, total, "job finished");
        Ok(p)
    }

    async fn dispatch(&self, unit: &SendUnit) -> Result<MessageId, HeraldError> {
        match AssertUnwindSafe(self.channel.send(unit)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(HeraldError::channel(format!(
                "channel panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }

    /// Idle until woken by resume/cancel or the poll interval elapses.
    async fn wait_while_paused(&self, job: &Job) {
        tokio::select! {
            _ = job.woken().notified() => {}
            _ = job.cancellation().cancelled() => {}
            _ = tokio::time::sleep(self.settings.pause_poll_interval) => {}
        }
    }

    async fn preflight(&self) -> Result<(), String> {
        match self.channel.session_status().await {
            Ok(status) if status.logged_in => Ok(()),
            Ok(_) => Err("channel session is not logged in".to_string()),
            Err(e) => Err(format!("session check failed: {e}")),
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

fn claim(job: &Job) -> Result<(), CampaignError> {
    if job.claim_driver() {
        Ok(())
    } else {
        Err(CampaignError::AlreadyDriven {
            id: job.id().clone(),
        })
    }
}
