// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by Herald adapters and collaborators.

use thiserror::Error;

/// The primary error type used across adapter traits and collaborator crates.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Configuration errors (missing credentials, invalid header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Channel errors (transport failure, rejected recipient, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Caller-supplied data that cannot be used (bad data URL, row out of range).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HeraldError {
    /// Shorthand for a channel error without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }
}
