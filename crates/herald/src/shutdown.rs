// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown on SIGTERM and SIGINT.
//!
//! The returned [`CancellationToken`] stops the gateway; `serve` then cancels
//! every running job and waits for each driver to exit at its next checkpoint.

use std::time::Duration;

use herald_campaign::CampaignService;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            info!("received SIGINT (Ctrl+C), initiating shutdown");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}

/// How long shutdown waits for drivers to finish their in-flight send.
pub const DRIVER_GRACE: Duration = Duration::from_secs(30);

/// Stops every running job and waits up to `grace` for the drivers to exit.
pub async fn stop_jobs(service: &CampaignService, grace: Duration) {
    let summary = service.summary();
    if !summary.running {
        info!(jobs = summary.jobs, "no running jobs to stop");
        return;
    }
    let cancelled = service.shutdown(grace).await;
    info!(cancelled, "running jobs stopped for shutdown");
}
