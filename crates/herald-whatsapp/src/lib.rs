// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp channel adapter for Herald.
//!
//! Implements [`ChannelAdapter`] over the WhatsApp Cloud API. Text units are
//! sent as text messages; units with an image are sent as image messages with
//! the text as caption. Inline images are uploaded once per campaign and the
//! media id is reused for every recipient.

pub mod client;
pub mod types;

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use async_trait::async_trait;
use herald_config::model::WhatsAppConfig;
use herald_core::error::HeraldError;
use herald_core::traits::{ChannelAdapter, PluginAdapter};
use herald_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, ImageSource, MessageId, SendUnit,
    SessionStatus,
};
use tracing::{debug, info};

use crate::client::CloudApiClient;
use crate::types::{ImageBody, MessageContent, MessageRequest, TextBody};

/// Longest text body the Cloud API accepts.
const MAX_TEXT_LENGTH: usize = 4096;

/// WhatsApp Cloud API channel implementing [`ChannelAdapter`].
pub struct WhatsAppChannel {
    client: CloudApiClient,
    /// Last uploaded inline image and its media id.
    uploaded: Mutex<Option<(Weak<ImageSource>, String)>>,
}

impl WhatsAppChannel {
    /// Creates a new WhatsApp channel adapter.
    ///
    /// Requires `whatsapp.phone_number_id` and `whatsapp.access_token`.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, HeraldError> {
        let phone_number_id = required(config.phone_number_id.as_deref(), "phone_number_id")?;
        let access_token = required(config.access_token.as_deref(), "access_token")?;

        let client = CloudApiClient::new(
            &config.api_base_url,
            phone_number_id,
            access_token,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self {
            client,
            uploaded: Mutex::new(None),
        })
    }

    pub fn client(&self) -> &CloudApiClient {
        &self.client
    }

    async fn media_id(&self, image: &Arc<ImageSource>) -> Result<Option<String>, HeraldError> {
        let ImageSource::Inline { mime_type, data } = image.as_ref() else {
            return Ok(None);
        };

        if let Some(id) = self.cached_media_id(image) {
            return Ok(Some(id));
        }

        let id = self.client.upload_media(mime_type, data.clone()).await?;
        info!(media_id = %id, mime_type = %mime_type, bytes = data.len(), "image uploaded");
        *self.cache() = Some((Arc::downgrade(image), id.clone()));
        Ok(Some(id))
    }

    fn cached_media_id(&self, image: &Arc<ImageSource>) -> Option<String> {
        let cache = self.cache();
        let (weak, id) = cache.as_ref()?;
        let cached = weak.upgrade()?;
        Arc::ptr_eq(&cached, image).then(|| id.clone())
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, Option<(Weak<ImageSource>, String)>> {
        self.uploaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, HeraldError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(HeraldError::Config(format!(
            "whatsapp.{key} is required for the WhatsApp adapter"
        ))),
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        match self.client.is_authorized().await {
            Ok(true) => Ok(HealthStatus::Healthy),
            Ok(false) => Ok(HealthStatus::Degraded(
                "WhatsApp rejected the configured credentials".into(),
            )),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "WhatsApp API unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        debug!("WhatsApp channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_images: true,
            max_message_length: Some(MAX_TEXT_LENGTH),
        }
    }

    async fn send(&self, unit: &SendUnit) -> Result<MessageId, HeraldError> {
        let content = match &unit.image {
            None => MessageContent::Text {
                text: TextBody { body: &unit.text },
            },
            Some(image) => {
                let id = self.media_id(image).await?;
                let link = match image.as_ref() {
                    ImageSource::Link(url) => Some(url.as_str()),
                    ImageSource::Inline { .. } => None,
                };
                MessageContent::Image {
                    image: ImageBody {
                        id,
                        link,
                        caption: Some(&unit.text),
                    },
                }
            }
        };

        let request = MessageRequest::new(&unit.destination, content);
        let id = self.client.send_message(&request).await?;
        debug!(message_id = %id, destination = %unit.destination, "message accepted");
        Ok(MessageId(id))
    }

    async fn session_status(&self) -> Result<SessionStatus, HeraldError> {
        let logged_in = self.client.is_authorized().await?;
        Ok(SessionStatus { logged_in })
    }
}
