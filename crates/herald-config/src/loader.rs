// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./herald.toml` > `~/.config/herald/herald.toml` > `/etc/herald/herald.toml`
//! with environment variable overrides via `HERALD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HeraldConfig;

/// Config file name searched in each hierarchy level.
pub const CONFIG_FILE_NAME: &str = "herald.toml";

/// System-wide config location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/herald/herald.toml";

/// Top-level sections that environment variables may address.
const ENV_SECTIONS: &[&str] = &["server", "dispatch", "resolver", "whatsapp", "logging"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/herald/herald.toml`
/// 3. `~/.config/herald/herald.toml`
/// 4. `./herald.toml`
/// 5. `HERALD_*` environment variables
pub fn load_config() -> Result<HeraldConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
///
/// Replaces the XDG lookup when `--config` is given on the command line.
pub fn load_config_from_path(path: &Path) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchy loading, before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Path of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("herald").join(CONFIG_FILE_NAME))
}

/// Create the environment variable provider.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `HERALD_WHATSAPP_ACCESS_TOKEN` maps to `whatsapp.access_token`.
fn env_provider() -> Env {
    Env::prefixed("HERALD_").map(|key| env_key_to_path(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key onto a dotted config path.
pub(crate) fn env_key_to_path(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(field) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}
