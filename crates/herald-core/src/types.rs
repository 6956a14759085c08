// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the campaign engine.

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::HeraldError;

/// Identifier returned by a channel for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
}

/// Session state of a channel client, as reported to the surrounding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub logged_in: bool,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    pub supports_images: bool,
    pub max_message_length: Option<usize>,
}

/// An image attached to outgoing messages.
///
/// Either bytes carried inline (decoded from a `data:` URL) or a link the
/// channel fetches itself.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    Inline { mime_type: String, data: Vec<u8> },
    Link(String),
}

impl ImageSource {
    /// Parses a base64 `data:` URL such as `data:image/png;base64,iVBOR...`.
    pub fn from_data_url(url: &str) -> Result<Self, HeraldError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| HeraldError::InvalidInput("image is not a data URL".into()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| HeraldError::InvalidInput("data URL has no payload".into()))?;
        let mime_type = meta.strip_suffix(";base64").ok_or_else(|| {
            HeraldError::InvalidInput("only base64 data URLs are supported".into())
        })?;
        if mime_type.is_empty() {
            return Err(HeraldError::InvalidInput("data URL has no media type".into()));
        }

        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| HeraldError::InvalidInput(format!("invalid base64 image data: {e}")))?;

        Ok(Self::Inline {
            mime_type: mime_type.to_string(),
            data,
        })
    }

    /// Returns the media type for inline images.
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Self::Inline { mime_type, .. } => Some(mime_type),
            Self::Link(_) => None,
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline { mime_type, data } => f
                .debug_struct("Inline")
                .field("mime_type", mime_type)
                .field("len", &data.len())
                .finish(),
            Self::Link(url) => f.debug_tuple("Link").field(url).finish(),
        }
    }
}

/// One fully resolved message for one recipient.
///
/// The image is shared between all units of a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendUnit {
    /// Digits only, country-code prefixed.
    pub destination: String,
    pub text: String,
    pub image: Option<Arc<ImageSource>>,
}

impl SendUnit {
    pub fn new(destination: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: Arc<ImageSource>) -> Self {
        self.image = Some(image);
        self
    }
}
