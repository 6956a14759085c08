// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the WhatsApp Cloud API.

use serde::{Deserialize, Serialize};

/// Body of `POST /{phone_number_id}/messages`.
#[derive(Debug, Serialize)]
pub struct MessageRequest<'a> {
    pub messaging_product: &'static str,
    pub recipient_type: &'static str,
    pub to: &'a str,
    #[serde(flatten)]
    pub content: MessageContent<'a>,
}

impl<'a> MessageRequest<'a> {
    pub fn new(to: &'a str, content: MessageContent<'a>) -> Self {
        Self {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to,
            content,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent<'a> {
    Text { text: TextBody<'a> },
    Image { image: ImageBody<'a> },
}

#[derive(Debug, Serialize)]
pub struct TextBody<'a> {
    pub body: &'a str,
}

/// Image reference: either an uploaded media id or a public link.
#[derive(Debug, Serialize)]
pub struct ImageBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaUploadResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}
