// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use salonbook_assistant::AdminAssistant;
use salonbook_config::SalonbookConfig;
use salonbook_core::SalonError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub assistant: Arc<AdminAssistant>,
    pub auth: AuthConfig,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(assistant: Arc<AdminAssistant>, auth: AuthConfig) -> Self {
        Self {
            assistant,
            auth,
            start_time: Instant::now(),
        }
    }
}

/// Gateway server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub bearer_token: Option<String>,
    /// Largest accepted audio upload.
    pub max_audio_bytes: usize,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[redacted]"))
            .field("max_audio_bytes", &self.max_audio_bytes)
            .finish()
    }
}

impl From<&SalonbookConfig> for ServerConfig {
    fn from(config: &SalonbookConfig) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            bearer_token: config.gateway.bearer_token.clone(),
            max_audio_bytes: config.gateway.max_audio_bytes,
        }
    }
}

/// Builds the gateway router.
///
/// - GET /health (public)
/// - POST /api/chat, POST /api/voice, POST /api/transcribe, GET /api/providers
///   (bearer auth when a token is configured)
pub fn router(state: GatewayState, max_audio_bytes: usize) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let audio_routes = Router::new()
        .route("/api/voice", post(handlers::post_voice))
        .route("/api/transcribe", post(handlers::post_transcribe))
        .layer(DefaultBodyLimit::max(max_audio_bytes));

    let api_routes = Router::new()
        .route("/api/chat", post(handlers::post_chat))
        .route("/api/providers", get(handlers::get_providers))
        .merge(audio_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds the configured address and serves until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), SalonError> {
    let app = router(state, config.max_audio_bytes);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SalonError::Provider {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(
        auth = config.bearer_token.is_some(),
        "gateway listening on {addr}"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| SalonError::Provider {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_from_salonbook_config() {
        let mut config = SalonbookConfig::default();
        config.gateway.bearer_token = Some("tok".into());
        let server = ServerConfig::from(&config);
        assert_eq!(server.port, config.server.port);
        assert_eq!(server.max_audio_bytes, config.gateway.max_audio_bytes);
        let debug = format!("{server:?}");
        assert!(!debug.contains("tok\""));
        assert!(debug.contains("[redacted]"));
    }
}
