// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A single send job: its fixed units, mutable counters, and control signals.

use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use herald_core::SendUnit;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::{Notify, watch};
use tokio_util::sync::CancellationToken;

use crate::error::CampaignError;

/// Opaque job identifier (a v4 UUID rendered as text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle phase derived from the job's flags.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobPhase {
    Running,
    Paused,
    Cancelled,
    Done,
}

/// Mutable part of a job, guarded by the job's lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    /// Index of the next unit to attempt.
    pub cursor: usize,
    pub sent: usize,
    pub failed: usize,
    pub paused: bool,
    pub cancelled: bool,
    pub running: bool,
    pub last_error: String,
}

impl JobState {
    fn new() -> Self {
        Self {
            cursor: 0,
            sent: 0,
            failed: 0,
            paused: false,
            cancelled: false,
            running: true,
            last_error: String::new(),
        }
    }

    pub fn phase(&self) -> JobPhase {
        match (self.running, self.cancelled, self.paused) {
            (_, true, _) => JobPhase::Cancelled,
            (false, false, _) => JobPhase::Done,
            (true, false, true) => JobPhase::Paused,
            (true, false, false) => JobPhase::Running,
        }
    }

    fn check(&self, total: usize) -> Result<(), String> {
        if self.sent + self.failed > self.cursor {
            return Err(format!(
                "sent ({}) + failed ({}) exceeds cursor ({})",
                self.sent, self.failed, self.cursor
            ));
        }
        if self.cursor > total {
            return Err(format!("cursor ({}) exceeds total ({total})", self.cursor));
        }
        Ok(())
    }
}

/// Read-only snapshot served to progress consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub paused: bool,
    pub running: bool,
    pub cancelled: bool,
    pub state: JobPhase,
    pub last_error: String,
}

impl Progress {
    fn of(state: &JobState, total: usize) -> Self {
        Self {
            total,
            sent: state.sent,
            failed: state.failed,
            paused: state.paused,
            running: state.running,
            cancelled: state.cancelled,
            state: state.phase(),
            last_error: state.last_error.clone(),
        }
    }
}

/// What the driver should do next, read atomically from the job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Checkpoint {
    Cancelled,
    Paused,
    Dispatch(usize),
    Drained,
}

/// One send campaign.
///
/// Units and delay are fixed at creation. Counters and flags live behind a
/// mutex that is never held across an await point.
pub struct Job {
    id: JobId,
    units: Arc<[SendUnit]>,
    delay: Duration,
    state: Mutex<JobState>,
    wake: Notify,
    cancel: CancellationToken,
    progress: watch::Sender<Progress>,
    driven: AtomicBool,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("total", &self.units.len())
            .field("delay", &self.delay)
            .field("state", &*self.lock())
            .finish()
    }
}

impl Job {
    pub(crate) fn new(id: JobId, units: Vec<SendUnit>, delay: Duration) -> Self {
        let state = JobState::new();
        let (progress, _) = watch::channel(Progress::of(&state, units.len()));
        Self {
            id,
            units: units.into(),
            delay,
            state: Mutex::new(state),
            wake: Notify::new(),
            cancel: CancellationToken::new(),
            progress,
            driven: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn units(&self) -> &[SendUnit] {
        &self.units
    }

    pub fn total(&self) -> usize {
        self.units.len()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// A copy of the current mutable state.
    pub fn state(&self) -> JobState {
        self.lock().clone()
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.lock(), self.total())
    }

    /// Receiver that sees a fresh snapshot after every committed change.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Apply one atomic transition, verify invariants, and publish progress.
    ///
    /// A transition that breaks the counters stops the job and returns
    /// [`CampaignError::StoreCorruption`].
    pub fn update<R>(&self, f: impl FnOnce(&mut JobState) -> R) -> Result<R, CampaignError> {
        let mut state = self.lock();
        let out = f(&mut state);
        let checked = state.check(self.total());
        if let Err(detail) = &checked {
            state.running = false;
            state.last_error = detail.clone();
        }
        self.progress.send_replace(Progress::of(&state, self.total()));
        drop(state);

        match checked {
            Ok(()) => Ok(out),
            Err(detail) => Err(CampaignError::StoreCorruption {
                id: self.id.clone(),
                detail,
            }),
        }
    }

    /// Request suspension. No effect on paused, cancelled or finished jobs.
    pub fn pause(&self) -> Result<bool, CampaignError> {
        self.update(|s| {
            let applies = s.running && !s.cancelled && !s.paused;
            if applies {
                s.paused = true;
            }
            applies
        })
    }

    /// Lift a pause. No effect unless paused.
    pub fn resume(&self) -> Result<bool, CampaignError> {
        let applied = self.update(|s| std::mem::replace(&mut s.paused, false))?;
        if applied {
            self.wake.notify_one();
        }
        Ok(applied)
    }

    /// Request termination. Irreversible; the driver stops at its next checkpoint.
    pub fn cancel(&self) -> Result<bool, CampaignError> {
        let applied = self.update(|s| !std::mem::replace(&mut s.cancelled, true))?;
        self.cancel.cancel();
        self.wake.notify_one();
        Ok(applied)
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        let state = self.lock();
        if state.cancelled {
            Checkpoint::Cancelled
        } else if state.paused {
            Checkpoint::Paused
        } else if state.cursor < self.total() {
            Checkpoint::Dispatch(state.cursor)
        } else {
            Checkpoint::Drained
        }
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn woken(&self) -> &Notify {
        &self.wake
    }

    /// Claim the single driver slot. Returns false if already claimed.
    pub(crate) fn claim_driver(&self) -> bool {
        !self.driven.swap(true, Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        // Counters are re-checked on every update, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(n: usize) -> Job {
        let units = (0..n).map(|i| SendUnit::new(format!("51{i}"), "hi")).collect();
        Job::new(JobId::generate(), units, Duration::ZERO)
    }

    #[test]
    fn new_job_starts_running_at_zero() {
        let job = job(3);
        let p = job.progress();
        assert_eq!(p.total, 3);
        assert_eq!((p.sent, p.failed), (0, 0));
        assert!(p.running && !p.paused && !p.cancelled);
        assert_eq!(p.state, JobPhase::Running);
        assert_eq!(p.last_error, "");
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let job = job(1);
        assert!(job.pause().unwrap());
        assert!(!job.pause().unwrap());
        assert_eq!(job.progress().state, JobPhase::Paused);
        assert!(job.resume().unwrap());
        assert!(!job.resume().unwrap());
        assert_eq!(job.progress().state, JobPhase::Running);
    }

    #[test]
    fn cancel_is_terminal_and_idempotent() {
        let job = job(1);
        assert!(job.cancel().unwrap());
        assert!(!job.cancel().unwrap());
        assert!(job.cancellation().is_cancelled());
        assert!(!job.pause().unwrap());
        assert_eq!(job.checkpoint(), Checkpoint::Cancelled);
        assert_eq!(job.progress().state, JobPhase::Cancelled);
    }

    #[test]
    fn pause_is_ignored_once_finished() {
        let job = job(1);
        job.update(|s| {
            s.cursor = 1;
            s.sent = 1;
            s.running = false;
        })
        .unwrap();
        assert!(!job.pause().unwrap());
        assert_eq!(job.progress().state, JobPhase::Done);
    }

    #[test]
    fn broken_counters_report_corruption_and_stop() {
        let job = job(2);
        let err = job.update(|s| s.sent = 1).unwrap_err();
        assert!(matches!(err, CampaignError::StoreCorruption { .. }));
        let p = job.progress();
        assert!(!p.running);
        assert!(p.last_error.contains("exceeds cursor"));
    }

    #[test]
    fn cursor_past_total_is_corruption() {
        let job = job(1);
        let err = job.update(|s| s.cursor = 2).unwrap_err();
        assert!(err.to_string().contains("exceeds total"));
    }

    #[test]
    fn checkpoint_walks_units_then_drains() {
        let job = job(2);
        assert_eq!(job.checkpoint(), Checkpoint::Dispatch(0));
        job.update(|s| {
            s.cursor = 2;
            s.sent = 2;
        })
        .unwrap();
        assert_eq!(job.checkpoint(), Checkpoint::Drained);
    }

    #[test]
    fn driver_slot_is_claimed_once() {
        let job = job(1);
        assert!(job.claim_driver());
        assert!(!job.claim_driver());
    }

    #[test]
    fn updates_are_published() {
        let job = job(2);
        let rx = job.subscribe();
        job.update(|s| {
            s.cursor = 1;
            s.failed = 1;
            s.last_error = "boom".into();
        })
        .unwrap();
        let seen = rx.borrow().clone();
        assert_eq!(seen.failed, 1);
        assert_eq!(seen.last_error, "boom");
    }

    #[test]
    fn progress_serializes_camel_case() {
        let json = serde_json::to_value(job(1).progress()).unwrap();
        assert_eq!(json["lastError"], "");
        assert_eq!(json["state"], "running");
        assert_eq!(json["total"], 1);
    }

    #[test]
    fn job_ids_borrow_as_str() {
        let id = JobId::generate();
        let borrowed: &str = id.borrow();
        assert_eq!(borrowed, id.as_str());
        assert_eq!(borrowed.len(), 36);
    }
}
