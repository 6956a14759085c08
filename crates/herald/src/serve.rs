// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald serve` command implementation.
//!
//! Builds the WhatsApp channel, the job store and send engine, and serves the
//! control plane until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use herald_campaign::{
    CampaignService, EngineSettings, JobStore, RetryPolicy, RetryingChannel, SendEngine,
};
use herald_config::model::HeraldConfig;
use herald_core::{ChannelAdapter, HealthStatus, HeraldError, PluginAdapter};
use herald_gateway::{AppState, AuthConfig, GatewayConfig, start_server};
use herald_resolver::{PhoneRules, Resolver};
use herald_whatsapp::WhatsAppChannel;
use tracing::{error, info, warn};

use crate::shutdown;

/// Run the server until SIGINT/SIGTERM.
pub async fn run_serve(config: HeraldConfig) -> Result<(), HeraldError> {
    init_tracing(&config.logging.level);

    info!("starting herald serve");

    let whatsapp: Arc<dyn ChannelAdapter> = Arc::new(WhatsAppChannel::new(&config.whatsapp)?);
    match whatsapp.health_check().await {
        Ok(HealthStatus::Healthy) => info!(channel = whatsapp.name(), "channel ready"),
        Ok(status) => warn!(channel = whatsapp.name(), ?status, "channel not ready"),
        Err(e) => warn!(channel = whatsapp.name(), error = %e, "channel health check failed"),
    }

    let state = build_state(&config, Arc::clone(&whatsapp));
    let service = state.service.clone();
    let token = shutdown::install_signal_handler();

    let result = start_server(&gateway_config(&config), state, token).await;
    if let Err(e) = &result {
        error!(error = %e, "gateway stopped with error");
    }

    shutdown::stop_jobs(&service, shutdown::DRIVER_GRACE).await;
    if let Err(e) = whatsapp.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }

    info!("herald serve stopped");
    result
}

/// Assemble the gateway state from configuration and a channel.
pub fn build_state(config: &HeraldConfig, channel: Arc<dyn ChannelAdapter>) -> AppState {
    let channel = RetryingChannel::wrap(channel, RetryPolicy::from(&config.dispatch));
    let engine = SendEngine::new(channel, EngineSettings::from(&config.dispatch));
    let service = CampaignService::new(Arc::new(JobStore::new()), engine);
    let resolver = Resolver::new(PhoneRules::from(&config.resolver));

    AppState::new(
        service,
        resolver,
        Duration::from_secs(config.dispatch.default_delay_secs),
    )
    .with_auth(AuthConfig {
        bearer_token: config.server.bearer_token.clone(),
    })
}

fn gateway_config(config: &HeraldConfig) -> GatewayConfig {
    GatewayConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        cors_origins: config.server.cors_origins.clone(),
        max_body_bytes: config.server.max_body_bytes,
    }
}

/// Initialize the tracing subscriber with the configured log level.
///
/// `RUST_LOG` overrides the configured filter when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("herald={log_level},tower_http=info,warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use herald_test_utils::MockChannel;

    use super::*;

    #[test]
    fn build_state_applies_dispatch_settings() {
        let mut config = HeraldConfig::default();
        config.dispatch.default_delay_secs = 7;
        config.dispatch.pause_poll_interval_ms = 500;
        config.server.bearer_token = Some("t0ken".into());

        let state = build_state(&config, Arc::new(MockChannel::new()));

        assert_eq!(state.default_delay, Duration::from_secs(7));
        assert_eq!(
            state.service.engine().settings().pause_poll_interval,
            Duration::from_millis(500)
        );
        assert_eq!(state.auth.bearer_token.as_deref(), Some("t0ken"));
    }

    #[test]
    fn retry_wrapper_is_installed_only_when_enabled() {
        let mut config = HeraldConfig::default();
        config.dispatch.max_attempts = 1;
        let state = build_state(&config, Arc::new(MockChannel::new()));
        assert_eq!(state.service.engine().channel().name(), "mock-channel");

        config.dispatch.max_attempts = 3;
        let state = build_state(&config, Arc::new(MockChannel::new()));
        assert_eq!(
            state.service.engine().channel().name(),
            "mock-channel+retry"
        );
    }

    #[test]
    fn gateway_config_mirrors_server_section() {
        let config = HeraldConfig::default();
        let gateway = gateway_config(&config);
        assert_eq!(gateway.host, config.server.host);
        assert_eq!(gateway.port, config.server.port);
        assert_eq!(gateway.cors_origins, config.server.cors_origins);
        assert_eq!(gateway.max_body_bytes, config.server.max_body_bytes);
    }
}
