// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: bind address shape,
//! poll interval bounds, attempt counts and URL schemes.

use std::ops::RangeInclusive;

use crate::diagnostic::ConfigError;
use crate::model::HeraldConfig;

/// Accepted range for `dispatch.pause_poll_interval_ms`.
pub const PAUSE_POLL_RANGE_MS: RangeInclusive<u64> = 200..=1000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of failing on the first one.
pub fn validate_config(config: &HeraldConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.server.max_body_bytes == 0 {
        errors.push(ConfigError::validation(
            "server.max_body_bytes must be greater than 0",
        ));
    }

    let poll = config.dispatch.pause_poll_interval_ms;
    if !PAUSE_POLL_RANGE_MS.contains(&poll) {
        errors.push(ConfigError::validation(format!(
            "dispatch.pause_poll_interval_ms must be between {} and {}, got {poll}",
            PAUSE_POLL_RANGE_MS.start(),
            PAUSE_POLL_RANGE_MS.end()
        )));
    }

    if config.dispatch.max_attempts == 0 {
        errors.push(ConfigError::validation(
            "dispatch.max_attempts must be at least 1",
        ));
    }

    let code = &config.resolver.default_country_code;
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ConfigError::validation(format!(
            "resolver.default_country_code must be digits only, got `{code}`"
        )));
    }

    if config.resolver.local_number_length == 0 {
        errors.push(ConfigError::validation(
            "resolver.local_number_length must be at least 1",
        ));
    }

    let base = &config.whatsapp.api_base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "whatsapp.api_base_url must start with http:// or https://, got `{base}`"
        )));
    }

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "logging.level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.logging.level
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
