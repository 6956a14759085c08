// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Header normalization and name/phone column detection.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Fold a header into a comparable key.
///
/// `"  Teléfono Móvil "` becomes `"telefono movil"`.
pub fn normalize_key(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    NON_ALNUM.replace_all(&folded, " ").trim().to_string()
}

/// Index of the contact name column, if any header looks like one.
pub fn detect_name_column(headers: &[String]) -> Option<usize> {
    headers.iter().map(|h| normalize_key(h)).position(|key| {
        key == "nombre" || key.starts_with("nombre") || key.contains("cliente")
    })
}

/// Index of the phone column, if any header looks like one.
pub fn detect_phone_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .map(|h| normalize_key(h))
        .position(|key| key == "telefono" || key.contains("cel") || key.contains("phone"))
}
