// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional retry policy applied around a channel's single-attempt `send`.
//!
//! The engine never retries on its own. Wrapping the channel in
//! [`RetryingChannel`] makes each dispatch up to `max_attempts` sends with
//! exponential backoff, while the engine still sees one outcome per unit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use herald_config::model::DispatchConfig;
use herald_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, HealthStatus, HeraldError, MessageId,
    PluginAdapter, SendUnit, SessionStatus,
};
use tracing::warn;

/// Attempts and backoff for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Clamped to at least 1.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles for each later attempt.
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// Whether this policy does anything beyond a single attempt.
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Wait before attempt number `attempt` (1-based). Zero for the first.
    pub fn backoff(&self, attempt: u32) -> Duration {
        match attempt {
            0 | 1 => Duration::ZERO,
            n => self.base_backoff.saturating_mul(2u32.saturating_pow(n - 2)),
        }
    }
}

impl From<&DispatchConfig> for RetryPolicy {
    fn from(config: &DispatchConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }
}

/// A `ChannelAdapter` decorator that retries failed sends.
pub struct RetryingChannel {
    inner: Arc<dyn ChannelAdapter>,
    policy: RetryPolicy,
    name: String,
}

impl RetryingChannel {
    pub fn new(inner: Arc<dyn ChannelAdapter>, policy: RetryPolicy) -> Self {
        let name = format!("{}+retry", inner.name());
        Self {
            inner,
            policy,
            name,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Wrap `channel` only when `policy` asks for more than one attempt.
    pub fn wrap(channel: Arc<dyn ChannelAdapter>, policy: RetryPolicy) -> Arc<dyn ChannelAdapter> {
        if policy.is_enabled() {
            Arc::new(Self::new(channel, policy))
        } else {
            channel
        }
    }
}

#[async_trait]
impl PluginAdapter for RetryingChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        self.inner.version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl ChannelAdapter for RetryingChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        self.inner.capabilities()
    }

    async fn send(&self, unit: &SendUnit) -> Result<MessageId, HeraldError> {
        let mut attempt = 1;
        loop {
            match self.inner.send(unit).await {
                Ok(id) => return Ok(id),
                Err(e) if attempt >= self.policy.max_attempts => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let wait = self.policy.backoff(attempt);
                    warn!(
                        destination = %unit.destination,
                        attempt,
                        backoff_ms = wait.as_millis() as u64,
                        error = %e,
                        "send failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    async fn session_status(&self) -> Result<SessionStatus, HeraldError> {
        self.inner.session_status().await
    }
}
