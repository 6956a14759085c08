// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter`, records every dispatch call in
//! order and fails on scripted destinations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use herald_core::traits::adapter::PluginAdapter;
use herald_core::traits::channel::ChannelAdapter;
use herald_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, MessageId, SendUnit, SessionStatus,
};
use herald_core::HeraldError;

/// One recorded `send` call.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub unit: SendUnit,
    pub at: Instant,
    pub ok: bool,
}

#[derive(Debug)]
struct ScriptedFailure {
    reason: String,
    /// `None` fails forever.
    remaining: Option<u32>,
}

/// A mock messaging channel for testing.
///
/// Every call to `send()` is captured, successful or not, so tests can
/// assert on dispatch order and timing.
pub struct MockChannel {
    calls: Arc<Mutex<Vec<Dispatch>>>,
    failures: Arc<Mutex<HashMap<String, ScriptedFailure>>>,
    panics: Arc<Mutex<HashSet<String>>>,
    latency: Option<Duration>,
    logged_in: AtomicBool,
    session_broken: AtomicBool,
    notify: Arc<Notify>,
}

impl MockChannel {
    /// Create a mock channel that accepts everything instantly.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            panics: Arc::new(Mutex::new(HashSet::new())),
            latency: None,
            logged_in: AtomicBool::new(true),
            session_broken: AtomicBool::new(false),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Make each `send()` take `latency` before returning.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every send to `destination` with `reason`.
    pub async fn fail_destination(&self, destination: &str, reason: &str) {
        self.failures.lock().await.insert(
            destination.to_string(),
            ScriptedFailure {
                reason: reason.to_string(),
                remaining: None,
            },
        );
    }

    /// Fail the next `times` sends to `destination`, then succeed.
    pub async fn fail_times(&self, destination: &str, times: u32, reason: &str) {
        self.failures.lock().await.insert(
            destination.to_string(),
            ScriptedFailure {
                reason: reason.to_string(),
                remaining: Some(times),
            },
        );
    }

    /// Panic inside `send()` for every unit addressed to `destination`.
    /// Nothing is recorded for those calls.
    pub async fn panic_on(&self, destination: &str) {
        self.panics.lock().await.insert(destination.to_string());
    }

    /// Toggle what `session_status()` reports.
    pub fn set_logged_in(&self, logged_in: bool) {
        self.logged_in.store(logged_in, Ordering::SeqCst);
    }

    /// Make `session_status()` return a transport error.
    pub fn break_session(&self) {
        self.session_broken.store(true, Ordering::SeqCst);
    }

    /// All recorded calls, in dispatch order.
    pub async fn calls(&self) -> Vec<Dispatch> {
        self.calls.lock().await.clone()
    }

    /// Units passed to `send()`, in dispatch order.
    pub async fn dispatched(&self) -> Vec<SendUnit> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|c| c.unit.clone())
            .collect()
    }

    /// Destinations passed to `send()`, in dispatch order.
    pub async fn destinations(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|c| c.unit.destination.clone())
            .collect()
    }

    /// Get the count of `send()` calls.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Wait until at least `count` sends have been recorded.
    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.call_count().await >= count {
                return;
            }
            notified.await;
        }
    }

    async fn scripted_failure(&self, destination: &str) -> Option<String> {
        let mut failures = self.failures.lock().await;
        let failure = failures.get_mut(destination)?;
        match failure.remaining {
            None => Some(failure.reason.clone()),
            Some(0) => None,
            Some(ref mut n) => {
                *n -= 1;
                Some(failure.reason.clone())
            }
        }
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_images: true,
            max_message_length: None,
        }
    }

    async fn send(&self, unit: &SendUnit) -> Result<MessageId, HeraldError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let panics = self.panics.lock().await.contains(&unit.destination);
        if panics {
            panic!("mock channel panicked sending to {}", unit.destination);
        }

        let failure = self.scripted_failure(&unit.destination).await;
        self.calls.lock().await.push(Dispatch {
            unit: unit.clone(),
            at: Instant::now(),
            ok: failure.is_none(),
        });
        self.notify.notify_waiters();

        match failure {
            Some(reason) => Err(HeraldError::channel(reason)),
            None => Ok(MessageId(format!("mock-msg-{}", uuid::Uuid::new_v4()))),
        }
    }

    async fn session_status(&self) -> Result<SessionStatus, HeraldError> {
        if self.session_broken.load(Ordering::SeqCst) {
            return Err(HeraldError::channel("session endpoint unreachable"));
        }
        Ok(SessionStatus {
            logged_in: self.logged_in.load(Ordering::SeqCst),
        })
    }
}
