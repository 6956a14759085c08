// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Placeholder written over secrets when a config is displayed.
pub const REDACTED: &str = "[redacted]";

/// Top-level Herald configuration.
///
/// All sections are optional and default to values suitable for running the
/// sender on a workstation next to its browser UI.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeraldConfig {
    /// HTTP control plane settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Send-job engine settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Recipient resolution settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// WhatsApp Cloud API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HeraldConfig {
    /// Returns a copy with every secret replaced by [`REDACTED`].
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.server.bearer_token.is_some() {
            copy.server.bearer_token = Some(REDACTED.to_string());
        }
        if copy.whatsapp.access_token.is_some() {
            copy.whatsapp.access_token = Some(REDACTED.to_string());
        }
        copy
    }
}

/// HTTP control plane configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. `"*"` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Bearer token required on control routes. `None` leaves them open.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Largest request body accepted on control routes, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            bearer_token: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

/// Send-job engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Delay between consecutive units when a request does not specify one.
    #[serde(default = "default_delay_secs")]
    pub default_delay_secs: u64,

    /// How often a paused job re-checks its flags, in milliseconds.
    #[serde(default = "default_pause_poll_interval_ms")]
    pub pause_poll_interval_ms: u64,

    /// Check the channel session before dispatching the first unit.
    #[serde(default = "default_require_session")]
    pub require_session: bool,

    /// Attempts per unit. Values above 1 enable the retry policy.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt; doubles for each further attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_delay_secs: default_delay_secs(),
            pause_poll_interval_ms: default_pause_poll_interval_ms(),
            require_session: default_require_session(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_delay_secs() -> u64 {
    5
}

fn default_pause_poll_interval_ms() -> u64 {
    300
}

fn default_require_session() -> bool {
    false
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

/// Recipient resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Country calling code prefixed to local numbers.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,

    /// Number of digits in a local number without country code.
    #[serde(default = "default_local_number_length")]
    pub local_number_length: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_country_code: default_country_code(),
            local_number_length: default_local_number_length(),
        }
    }
}

fn default_country_code() -> String {
    "51".to_string()
}

fn default_local_number_length() -> usize {
    9
}

/// WhatsApp Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Graph API base URL, including the version segment.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Sender phone number id. Required to serve.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Cloud API access token. Required to serve.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            phone_number_id: None,
            access_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for `herald` targets (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
