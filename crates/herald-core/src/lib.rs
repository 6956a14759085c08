// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Herald, a bulk personalized messaging sender.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the workspace. Channel clients implement the
//! traits defined here; the campaign engine consumes them.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::HeraldError;
pub use traits::{ChannelAdapter, PluginAdapter};
pub use types::{
    AdapterType, ChannelCapabilities, HealthStatus, ImageSource, MessageId, SendUnit,
    SessionStatus,
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn herald_error_variants_display() {
        let cases = [
            (
                HeraldError::Config("whatsapp.access_token is required".into()),
                "configuration error: whatsapp.access_token is required",
            ),
            (
                HeraldError::InvalidInput("row 4 out of range".into()),
                "invalid input: row 4 out of range",
            ),
            (
                HeraldError::Timeout {
                    duration: std::time::Duration::from_secs(30),
                },
                "operation timed out after 30s",
            ),
            (
                HeraldError::Internal("bind failed".into()),
                "internal error: bind failed",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn channel_error_keeps_source() {
        use std::error::Error;

        let err = HeraldError::Channel {
            message: "upload failed".into(),
            source: Some(Box::new(std::io::Error::other("connection reset"))),
        };
        assert_eq!(err.to_string(), "channel error: upload failed");
        assert_eq!(err.source().unwrap().to_string(), "connection reset");
        assert!(HeraldError::channel("x").source().is_none());
    }

    #[test]
    fn channel_error_displays_message() {
        let err = HeraldError::channel("recipient not on WhatsApp");
        assert_eq!(err.to_string(), "channel error: recipient not on WhatsApp");
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        let s = AdapterType::Channel.to_string();
        assert_eq!(AdapterType::from_str(&s).unwrap(), AdapterType::Channel);
    }

    #[test]
    fn session_status_serializes_camel_case() {
        let json = serde_json::to_string(&SessionStatus { logged_in: true }).unwrap();
        assert_eq!(json, r#"{"loggedIn":true}"#);
    }

    #[test]
    fn data_url_decodes_inline_image() {
        // "hi" in base64
        let image = ImageSource::from_data_url("data:image/png;base64,aGk=").unwrap();
        assert_eq!(
            image,
            ImageSource::Inline {
                mime_type: "image/png".into(),
                data: b"hi".to_vec(),
            }
        );
        assert_eq!(image.mime_type(), Some("image/png"));
    }

    #[test]
    fn data_url_rejects_malformed_input() {
        assert!(ImageSource::from_data_url("https://example.com/a.png").is_err());
        assert!(ImageSource::from_data_url("data:image/png;base64").is_err());
        assert!(ImageSource::from_data_url("data:image/png,aGk=").is_err());
        assert!(ImageSource::from_data_url("data:;base64,aGk=").is_err());
        assert!(ImageSource::from_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn inline_image_debug_omits_bytes() {
        let image = ImageSource::Inline {
            mime_type: "image/jpeg".into(),
            data: vec![0xff; 1024],
        };
        let debug = format!("{image:?}");
        assert!(debug.contains("len: 1024"));
        assert!(!debug.contains("255"));
    }

    #[test]
    fn send_unit_shares_image() {
        let image = Arc::new(ImageSource::Link("https://example.com/a.png".into()));
        let a = SendUnit::new("51999111222", "hi").with_image(Arc::clone(&image));
        let b = SendUnit::new("51999111333", "hi").with_image(Arc::clone(&image));
        assert!(Arc::ptr_eq(a.image.as_ref().unwrap(), b.image.as_ref().unwrap()));
    }
}
