// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send-job engine for Herald campaigns.
//!
//! A [`JobStore`] holds every job created during the process lifetime. The
//! [`SendEngine`] runs one sequential driver per job, dispatching units
//! through a [`ChannelAdapter`](herald_core::ChannelAdapter) in order,
//! honouring pause/resume/cancel between units and spacing sends by the
//! job's delay. [`CampaignService`] ties both together for transports.

pub mod engine;
pub mod error;
pub mod job;
pub mod retry;
pub mod service;
pub mod store;

pub use engine::{EngineSettings, SendEngine};
pub use error::CampaignError;
pub use job::{Job, JobId, JobPhase, JobState, Progress};
pub use retry::{RetryPolicy, RetryingChannel};
pub use service::CampaignService;
pub use store::{JobStore, StoreSummary};
