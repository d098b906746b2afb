// ABOUTME: Entry point for the receiver-gateway binary.
// ABOUTME: Loads .env and environment config, applies CLI overrides, initializes tracing, and serves the gateway.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use receiver_gateway_server::{AppState, GatewayConfig, create_router, spawn_session_sweeper};
use receiver_gateway_upstream::normalize_base_url;

/// How often expired sessions are swept from memory.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Authenticated reverse proxy in front of an SRTLA receiver API.
#[derive(Debug, Parser)]
#[command(name = "receiver-gateway", version, about)]
struct Cli {
    /// Socket address to listen on (overrides GATEWAY_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Receiver API base URL (overrides RECEIVER_API)
    #[arg(long)]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("receiver_gateway=debug,tower_http=debug")
                }),
        )
        .init();

    let cli = Cli::parse();

    let mut config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(upstream) = cli.upstream {
        config.upstream_url = normalize_base_url(&upstream).context("invalid --upstream")?;
    }

    let state = Arc::new(AppState::from_config(&config).context("failed to build upstream client")?);
    let sweeper = spawn_session_sweeper(&state, SESSION_SWEEP_INTERVAL);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(
        bind = %config.bind,
        upstream = %config.upstream_url,
        timeout_secs = config.upstream_timeout.as_secs(),
        accounts = config.accounts.len(),
        "Dashboard API running"
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    tracing::info!("receiver-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
