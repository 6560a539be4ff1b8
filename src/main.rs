// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use sealed_token_server::{
    api::router,
    auth::KeyStore,
    config::Settings,
    state::AppState,
    telemetry::{init_tracing, TracingReporter},
};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(settings.log_format);
    tracing::info!(environment = settings.environment.name(), "Starting sealed token server");

    // Key material is resolved once here so a broken deployment fails fast.
    let keys = Arc::new(KeyStore::new(settings.keys.clone()));
    if let Err(e) = keys.preload() {
        tracing::error!(error = %e, "Failed to load signing keys");
        return ExitCode::FAILURE;
    }

    if settings.claim_secret.is_none() {
        tracing::warn!("CLAIM_SECRET is not set; issuance and verification will fail");
    }

    let state = AppState::new(&settings, keys, Arc::new(TracingReporter));
    let app = router(state);

    let addr: SocketAddr = match format!("{}:{}", settings.host, settings.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(host = %settings.host, error = %e, "Failed to parse bind address");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%addr, "Listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shut down");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
