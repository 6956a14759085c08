// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Herald integration tests.
//!
//! Provides a scriptable mock channel so engine and gateway tests run
//! deterministically without a WhatsApp account.

use herald_core::SendUnit;

pub mod mock_channel;

pub use mock_channel::{Dispatch, MockChannel};

/// `count` text units addressed to `51900000000`, `51900000001`, ...
pub fn sample_units(count: usize) -> Vec<SendUnit> {
    (0..count)
        .map(|i| SendUnit::new(format!("519{i:08}"), format!("message {i}")))
        .collect()
}
