// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Herald configuration system.

use herald_config::diagnostic::ConfigError;
use herald_config::model::REDACTED;
use herald_config::{
    load_and_validate_from, load_and_validate_str, load_config_from_str, to_redacted_toml,
};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_herald_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
cors_origins = ["*"]
bearer_token = "local"
max_body_bytes = 8388608

[dispatch]
default_delay_secs = 2
pause_poll_interval_ms = 500
require_session = true
max_attempts = 3
retry_backoff_ms = 250

[resolver]
default_country_code = "34"
local_number_length = 9

[whatsapp]
api_base_url = "http://localhost:9999/v21.0"
phone_number_id = "1055"
access_token = "EAAG"
request_timeout_secs = 10

[logging]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.cors_origins, vec!["*"]);
    assert_eq!(config.server.bearer_token.as_deref(), Some("local"));
    assert_eq!(config.server.max_body_bytes, 8 * 1024 * 1024);
    assert_eq!(config.dispatch.default_delay_secs, 2);
    assert_eq!(config.dispatch.pause_poll_interval_ms, 500);
    assert!(config.dispatch.require_session);
    assert_eq!(config.dispatch.max_attempts, 3);
    assert_eq!(config.dispatch.retry_backoff_ms, 250);
    assert_eq!(config.resolver.default_country_code, "34");
    assert_eq!(config.whatsapp.phone_number_id.as_deref(), Some("1055"));
    assert_eq!(config.whatsapp.request_timeout_secs, 10);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.dispatch.pause_poll_interval_ms, 300);
}

/// A typo in a section key produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_key_gets_suggestion_and_span() {
    let toml = "[dispatch]\nmax_atempts = 3\n";
    let errors = load_and_validate_str(toml).expect_err("typo should be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "max_atempts");
            assert_eq!(suggestion.as_deref(), Some("max_attempts"));
            let span = span.expect("inline source should be located");
            assert_eq!(&toml[span.offset()..span.offset() + span.len()], "max_atempts");
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[telegram]\nbot_token = \"x\"\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::UnknownKey { key, .. } if key == "telegram"));
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[server]\nport = \"eight thousand\"\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::InvalidType { key, .. } if key.ends_with("port")));
}

#[test]
fn semantic_errors_surface_after_parse() {
    let errors =
        load_and_validate_str("[dispatch]\npause_poll_interval_ms = 50\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("pause_poll_interval_ms")));
}

#[test]
fn explicit_file_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("herald.toml");
    std::fs::write(&path, "[logging]\nlevel = \"chatty\"\n").unwrap();

    let errors = load_and_validate_from(Some(&path)).unwrap_err();
    assert!(errors[0].to_string().contains("logging.level"));
}

#[test]
fn redacted_toml_hides_tokens() {
    let config = load_and_validate_str(
        "[whatsapp]\naccess_token = \"EAAG-secret\"\nphone_number_id = \"1055\"\n",
    )
    .unwrap();
    let rendered = to_redacted_toml(&config).unwrap();
    assert!(!rendered.contains("EAAG-secret"));
    assert!(rendered.contains(REDACTED));
    assert!(rendered.contains("1055"));
}
