// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP server: `/print`, `/auth` and `/health` over axum.

mod handlers;
mod state;

pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use printgate_core::config::RelayConfig;
use printgate_core::error::{PrintgateError, Result};
use printgate_print::{Dialer, PrintRelay, TcpDialer};
use printgate_security::{Authenticator, InMemoryTokenStore, JsonFileUserRepository};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the router over any dialer.
pub fn router<D: Dialer + 'static>(state: AppState<D>) -> Router {
    Router::new()
        .route("/print", post(handlers::print::<D>))
        .route("/auth", post(handlers::auth::<D>))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.listen_addr` and serve until Ctrl+C or SIGTERM.
///
/// Shutdown cancels every in-flight print session; they answer 504 and
/// release their printer connections before the server exits.
pub async fn serve(config: RelayConfig) -> Result<()> {
    let users = Arc::new(JsonFileUserRepository::open_or_create(&config.users_file)?);
    let auth = Authenticator::new(users, Arc::new(InMemoryTokenStore::new()), config.token_ttl());
    let relay = PrintRelay::from_config(&config, TcpDialer);
    let shutdown = CancellationToken::new();
    let app = router(AppState::new(relay, auth, shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            PrintgateError::Server(format!("failed to bind {}: {e}", config.listen_addr))
        })?;

    info!(
        listen = %config.listen_addr,
        printer = %config.printer_address,
        connect_mode = ?config.connect.mode,
        users_file = %config.users_file.display(),
        "printgate listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
        .await
        .map_err(|e| PrintgateError::Server(format!("server error: {e}")))?;

    info!("printgate stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
