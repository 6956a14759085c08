// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control-plane HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post},
};
use herald_campaign::CampaignService;
use herald_core::HeraldError;
use herald_resolver::Resolver;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::{handlers, sse};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: CampaignService,
    pub resolver: Resolver,
    /// Delay applied when a request omits `delaySeconds`.
    pub default_delay: Duration,
    /// Process start time for uptime calculation.
    pub started: Instant,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(service: CampaignService, resolver: Resolver, default_delay: Duration) -> Self {
        Self {
            service,
            resolver,
            default_delay,
            started: Instant::now(),
            auth: AuthConfig::default(),
        }
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }
}

/// Largest request body accepted when no limit is configured.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Listener, CORS and body-size settings (mirrors `server` from herald-config).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    /// Upper bound on request bodies. Inline images repeat per message on `/send`.
    pub max_body_bytes: usize,
}

/// Build the router with every route and layer attached.
///
/// `/health` is public; every other route passes through the auth middleware
/// and accepts bodies up to `config.max_body_bytes`.
pub fn router(state: AppState, config: &GatewayConfig) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/send", post(handlers::post_send))
        .route("/campaigns", post(handlers::post_campaign))
        .route("/preview", post(handlers::post_preview))
        .route("/progress", get(handlers::get_progress))
        .route("/progress/stream", get(sse::progress_stream))
        .route("/pause", post(handlers::post_pause))
        .route("/resume", post(handlers::post_resume))
        .route("/cancel", post(handlers::post_cancel))
        .route("/status", get(handlers::get_status))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the control-plane server.
///
/// Serves until `shutdown` is cancelled, then stops accepting connections
/// and lets in-flight requests finish.
pub async fn start_server(
    config: &GatewayConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), HeraldError> {
    let app = router(state, config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HeraldError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| HeraldError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
