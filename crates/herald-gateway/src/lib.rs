// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP control plane for Herald.
//!
//! Exposes the campaign service to the browser client: start jobs from
//! pre-rendered messages or from a contact table, poll or stream progress,
//! and pause, resume or cancel running jobs.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod sse;

pub use auth::AuthConfig;
pub use error::{ApiError, ApiResult};
pub use server::{AppState, DEFAULT_MAX_BODY_BYTES, GatewayConfig, router, start_server};
