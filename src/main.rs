// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use imagecraft_server::{
    api::router,
    auth::SessionKey,
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    imaging::ArtifactSweeper,
    state::AppState,
};

/// Time allowed for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();
    init_tracing(config.log_format);

    let session_key = match config.session_secret.as_deref() {
        Some(secret) => {
            SessionKey::from_secret(secret.as_bytes()).expect("Invalid SESSION_SECRET")
        }
        None => {
            tracing::warn!(
                "SESSION_SECRET not set; using a random key, sessions will not survive restarts"
            );
            SessionKey::generate().expect("Failed to generate session key")
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");
    let tls = config.tls.clone();
    let artifact_ttl = config.artifact_ttl;
    let sweep_interval = config.sweep_interval;

    let state =
        AppState::new(config, session_key).expect("Failed to initialize application state");
    tracing::info!(
        data_dir = %state.config.paths.root().display(),
        "Data directories ready"
    );

    // Background tasks stop when this token is cancelled.
    let shutdown = CancellationToken::new();
    let sweeper_task = artifact_ttl.map(|ttl| {
        let sweeper =
            ArtifactSweeper::new(&state.config.paths, ttl).with_interval(sweep_interval);
        tokio::spawn(sweeper.run(shutdown.clone()))
    });
    if sweeper_task.is_none() {
        tracing::info!("Artifact sweeper disabled (ARTIFACT_TTL_SECS=0)");
    }

    let app = router(state);

    let handle = Handle::new();
    {
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });
    }

    match tls {
        Some(tls) => {
            // Install the ring crypto provider for rustls (must be done before any TLS operations)
            rustls::crypto::ring::default_provider()
                .install_default()
                .expect("Failed to install rustls crypto provider");

            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .expect("Failed to load TLS certificate or key");

            tracing::info!(%addr, "Imagecraft listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            tracing::info!(%addr, "Imagecraft listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTP server failed");
        }
    }

    shutdown.cancel();
    if let Some(task) = sweeper_task {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Artifact sweeper task failed");
        }
    }
    tracing::info!("Server stopped");
}
