use std::{future::Future, net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use axum::{http::StatusCode, Router};
use tokio::{net::TcpListener, sync::watch};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    api,
    application::SubscriptionService,
    config::{Config, ServerConfig},
};

/// Start the subscription API server
///
/// This function:
/// 1. Connects to the database and runs migrations
/// 2. Builds the Axum application
/// 3. Serves until SIGINT/SIGTERM, then drains in-flight requests
///    for at most `shutdown_grace_seconds` before giving up on them
pub async fn start_server(config: Config) -> Result<()> {
    info!("subtally starting...");

    let service = SubscriptionService::init(&config.database).await?;

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .with_context(|| format!("Invalid server.host '{}'", config.server.host))?,
        config.server.port,
    ));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    serve(listener, service, &config.server, shutdown_signal()).await
}

/// Serve `service` on `listener` until `shutdown` resolves or serving fails.
///
/// After shutdown, in-flight requests get `shutdown_grace_seconds` to finish
/// before they are aborted. The connection pool is closed on every exit path.
pub async fn serve<F>(
    listener: TcpListener,
    service: SubscriptionService,
    config: &ServerConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let app = build_app(service.clone(), config);
    let grace = Duration::from_secs(config.shutdown_grace_seconds);

    let outcome = run_until_shutdown(listener, app, grace, shutdown).await;
    service.repository().close().await;
    outcome
}

async fn run_until_shutdown<F>(
    listener: TcpListener,
    app: Router,
    grace: Duration,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
                info!("Shutdown signal received, draining connections...");
            })
            .await
    });

    tokio::select! {
        // Only reached before shutdown if serving itself failed.
        result = &mut server => {
            result.context("Server task panicked")??;
            return Ok(());
        }
        _ = shutdown => {}
    }

    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result.context("Server task panicked")??;
            info!("Server stopped gracefully");
        }
        Err(_) => {
            warn!(
                grace_seconds = grace.as_secs(),
                "Grace period elapsed, aborting remaining requests"
            );
            server.abort();
        }
    }

    Ok(())
}

/// The API router wrapped with request tracing and a per-request deadline.
///
/// A request that exceeds the deadline, or whose client goes away, has its
/// handler future dropped, which cancels the in-flight database call.
pub fn build_app(service: SubscriptionService, server: &ServerConfig) -> Router {
    api::router(service)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_seconds),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Resolve when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, initiating graceful shutdown"),
        _ = terminate => info!("SIGTERM received, initiating graceful shutdown"),
    }
}
