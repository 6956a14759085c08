// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Cloud API.
//!
//! Provides [`CloudApiClient`], which owns authentication headers and maps
//! Graph API error bodies into [`HeraldError`]s.

use std::time::Duration;

use herald_core::HeraldError;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::types::{
    ApiErrorResponse, MediaUploadResponse, MessageRequest, MessageResponse,
};

/// Thin client bound to one sender phone number.
#[derive(Debug, Clone)]
pub struct CloudApiClient {
    client: reqwest::Client,
    base_url: String,
    phone_number_id: String,
    timeout: Duration,
}

impl CloudApiClient {
    /// Creates a client for `phone_number_id`, authenticating with `access_token`.
    pub fn new(
        base_url: &str,
        phone_number_id: &str,
        access_token: &str,
        timeout: Duration,
    ) -> Result<Self, HeraldError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|e| HeraldError::Config(format!("invalid access token header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| HeraldError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            phone_number_id: phone_number_id.to_string(),
            timeout,
        })
    }

    fn endpoint(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("{}/{}", self.base_url, self.phone_number_id)
        } else {
            format!("{}/{}/{suffix}", self.base_url, self.phone_number_id)
        }
    }

    /// Posts one message and returns the id WhatsApp assigned to it.
    pub async fn send_message(&self, request: &MessageRequest<'_>) -> Result<String, HeraldError> {
        let response = self
            .client
            .post(self.endpoint("messages"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, to = request.to, "message response received");
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let body: MessageResponse = response.json().await.map_err(|e| HeraldError::Channel {
            message: format!("failed to parse message response: {e}"),
            source: Some(Box::new(e)),
        })?;
        body.messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| HeraldError::channel("message response carried no message id"))
    }

    /// Uploads image bytes and returns the media id to reference in a message.
    pub async fn upload_media(
        &self,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Result<String, HeraldError> {
        let part = Part::bytes(data)
            .file_name("attachment")
            .mime_str(mime_type)
            .map_err(|e| HeraldError::InvalidInput(format!("invalid image media type: {e}")))?;
        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", mime_type.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint("media"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, mime_type, "media upload response received");
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let body: MediaUploadResponse = response.json().await.map_err(|e| HeraldError::Channel {
            message: format!("failed to parse media upload response: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(body.id)
    }

    /// Whether the phone number is reachable with the configured token.
    ///
    /// Any HTTP answer is a definite yes or no; only transport failures error.
    pub async fn is_authorized(&self) -> Result<bool, HeraldError> {
        let response = self
            .client
            .get(self.endpoint(""))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        debug!(status = %response.status(), "phone number lookup");
        Ok(response.status().is_success())
    }

    fn transport_error(&self, e: reqwest::Error) -> HeraldError {
        if e.is_timeout() {
            HeraldError::Timeout {
                duration: self.timeout,
            }
        } else {
            HeraldError::Channel {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

async fn api_error(status: reqwest::StatusCode, response: reqwest::Response) -> HeraldError {
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(err) => format!("WhatsApp API error ({status}): {}", err.error.message),
        Err(_) => format!("WhatsApp API returned {status}: {body}"),
    };
    HeraldError::channel(message)
}
