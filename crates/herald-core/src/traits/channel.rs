// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for outbound messaging transports (WhatsApp, mocks).

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, MessageId, SendUnit, SessionStatus};

/// Adapter for an outbound messaging channel.
///
/// The campaign engine only ever calls [`send`](ChannelAdapter::send), one
/// unit at a time. Latency and failure modes are opaque to the caller.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Delivers one unit. A single attempt; callers decide whether to retry.
    async fn send(&self, unit: &SendUnit) -> Result<MessageId, HeraldError>;

    /// Reports whether the channel session is usable.
    async fn session_status(&self) -> Result<SessionStatus, HeraldError>;
}
