//! Inscriptions HTTP server.
//!
//! Event registration intake backed by `SQLite`, with email notifications and
//! a Prometheus scrape endpoint.

mod config;
mod mailer;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use config::{Config, DEFAULT_LOG_FILTER};
use inscriptions_core::environment::SystemClock;
use inscriptions_registration::metrics::register_business_metrics;
use inscriptions_registration::stores::{SqliteRegistrationStore, StoreConfig};
use inscriptions_registration::{
    IntakeEnvironment, NotificationDispatcher, RegistrationState, registration_router,
};
use inscriptions_runtime::metrics::{MetricsError, MetricsServer};
use mailer::ServerMailer;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (reads .env first so RUST_LOG can live there)
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.server.log_level)
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Inscriptions HTTP Server");

    config.validate().context("Invalid configuration")?;
    info!(
        database_url = %config.database.url,
        smtp_host = %config.smtp.host,
        smtp_transport = %config.smtp.transport,
        "Configuration loaded"
    );

    // Metrics
    let metrics_task = start_metrics(&config).await?;

    // Registration store
    info!("Opening registration database...");
    let store = Arc::new(
        SqliteRegistrationStore::open(&StoreConfig {
            url: config.database.url.clone(),
            max_connections: config.database.max_connections,
            operation_timeout: config.database.operation_timeout(),
        })
        .await
        .context("Failed to open registration database")?,
    );

    // Mailer
    let mailer = Arc::new(ServerMailer::from_config(&config.smtp)?);
    info!(transport = mailer.kind(), "Mailer ready");

    let admin_email = config
        .notification
        .notify_email
        .clone()
        .context("NOTIFY_EMAIL is required")?;

    let environment = IntakeEnvironment::new(
        Arc::clone(&store),
        NotificationDispatcher::new(mailer, admin_email, config.smtp.send_timeout()),
        Arc::new(SystemClock),
        config.database.operation_timeout(),
    );
    let state = RegistrationState::new(environment);
    info!(deadline = ?state.workflow_deadline, "Intake workflow configured");

    let app = registration_router(state);

    // Create TCP listener
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    // Run server until a signal arrives, then drain in-flight requests
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result.context("Server task panicked")??;
            warn!("Server exited without a shutdown signal");
        }
        () = shutdown_signal() => {
            let _ = stop_tx.send(());
            let grace = config.server.shutdown_timeout();
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result.context("Server task panicked")??,
                Err(_) => {
                    warn!(timeout = ?grace, "In-flight requests did not finish in time");
                    server.abort();
                }
            }
        }
    }

    metrics_task.abort();
    store.close().await;

    info!("Server stopped");
    Ok(())
}

/// Install the Prometheus recorder and serve `/metrics` on the metrics port.
async fn start_metrics(config: &Config) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let mut metrics = MetricsServer::new(config.server.metrics_addr()?);
    metrics.start()?;
    register_business_metrics();

    let handle = metrics.handle().cloned();
    let router = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.map(|h| h.render()).unwrap_or_default() }
        }),
    );

    let listener = tokio::net::TcpListener::bind(metrics.addr())
        .await
        .map_err(MetricsError::from)?;
    info!(address = %metrics.addr(), "Metrics endpoint listening");

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "Metrics server failed");
        }
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
