// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Destination normalization.

use herald_config::model::ResolverConfig;

/// Rules for turning free-form phone cells into channel destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneRules {
    pub country_code: String,
    pub local_length: usize,
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

impl From<&ResolverConfig> for PhoneRules {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            country_code: config.default_country_code.clone(),
            local_length: config.local_number_length,
        }
    }
}

impl PhoneRules {
    /// Digits only, country-code prefixed when the number looks local.
    ///
    /// Returns an empty string when the input has no digits at all.
    pub fn normalize(&self, raw: &str) -> String {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        let digits = digits.strip_prefix("00").unwrap_or(&digits);
        let digits = digits.strip_prefix('0').unwrap_or(digits);

        if digits.starts_with(&self.country_code) {
            return digits.to_string();
        }
        if digits.len() == self.local_length {
            return format!("{}{digits}", self.country_code);
        }
        digits.to_string()
    }
}
