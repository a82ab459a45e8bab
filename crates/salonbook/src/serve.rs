// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `salonbook serve` command implementation.
//!
//! Opens the SQLite store, builds one fallback chain per capability from the
//! configured provider orders, and serves the HTTP gateway until SIGINT or
//! SIGTERM.

use std::sync::Arc;

use salonbook_assistant::{AdminAssistant, InMemorySessionStore};
use salonbook_config::SalonbookConfig;
use salonbook_core::SalonError;
use salonbook_gateway::{AuthConfig, GatewayState, ServerConfig};
use salonbook_storage::SqliteStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::providers::build_orchestrator;

/// Runs the `salonbook serve` command.
pub async fn run_serve(config: SalonbookConfig) -> Result<(), SalonError> {
    init_tracing(&config.server.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting salonbook serve");

    let store = SqliteStore::open(&config.storage).await?;
    let orchestrator = Arc::new(build_orchestrator(&config).await?);

    let assistant = Arc::new(AdminAssistant::new(
        &config.assistant,
        orchestrator,
        Arc::new(store.clone()),
        Arc::new(InMemorySessionStore::new()),
    ));

    let server_config = ServerConfig::from(&config);
    if server_config.bearer_token.is_none() {
        warn!("gateway.bearer_token is not set; /api routes are open");
    }
    let state = GatewayState::new(
        assistant,
        AuthConfig {
            bearer_token: server_config.bearer_token.clone(),
        },
    );

    let shutdown = install_signal_handler();
    let served = salonbook_gateway::start_server(&server_config, state, shutdown).await;

    if let Err(e) = store.shutdown().await {
        warn!(error = %e, "failed to checkpoint database on shutdown");
    }
    info!("salonbook serve shutdown complete");
    served
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        trigger.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("salonbook={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
