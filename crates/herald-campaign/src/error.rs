// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors surfaced by the job store and engine.
//!
//! Per-unit dispatch failures are not represented here: the engine absorbs
//! them into the job's `failed` counter and `last_error`.

use thiserror::Error;

use crate::job::JobId;

#[derive(Debug, Error)]
pub enum CampaignError {
    /// A job was requested with no sendable units.
    #[error("job has no sendable units")]
    InvalidJob,

    /// The id does not name a job in the store.
    #[error("job {id} not found")]
    NotFound { id: String },

    /// A second driver was requested for a job that already has one.
    #[error("job {id} already has an active driver")]
    AlreadyDriven { id: JobId },

    /// Job counters broke `sent + failed <= cursor <= total`.
    #[error("job {id} state is corrupt: {detail}")]
    StoreCorruption { id: JobId, detail: String },
}

impl CampaignError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJob => "invalid_job",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyDriven { .. } => "already_driven",
            Self::StoreCorruption { .. } => "store_corruption",
        }
    }
}
