use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use matchtv_api::{create_router, AppState};
use matchtv_core::cache::ScrapeCache;
use matchtv_core::provider::{FootballSource, PageClient, VolleyballSource};
use matchtv_core::Config;
use matchtv_proxy::{StreamRelay, FOOTBALL_STREAM_PATH, TV_STREAM_PATH};

/// Wire the cache, schedule sources and both relays from configuration
pub fn build_state(config: &Config) -> Result<AppState> {
    let page_client = PageClient::from_config(&config.upstream)?;

    let football_relay =
        StreamRelay::from_config(&config.upstream, &config.relays.football, FOOTBALL_STREAM_PATH)?;
    let tv_relay = StreamRelay::from_config(&config.upstream, &config.relays.tv, TV_STREAM_PATH)?;

    info!(
        football_attempts = football_relay.fetcher().policy().max_attempts(),
        tv_attempts = tv_relay.fetcher().policy().max_attempts(),
        cache_ttl_secs = config.cache.ttl_seconds,
        "Relays and scrape cache initialized"
    );

    Ok(AppState {
        cache: ScrapeCache::from_config(&config.cache),
        football_source: Arc::new(FootballSource::new(
            page_client.clone(),
            config.sources.football_url.clone(),
        )),
        volleyball_source: Arc::new(VolleyballSource::new(
            page_client,
            config.sources.volleyball_url.clone(),
        )),
        football_relay: Arc::new(football_relay),
        tv_relay: Arc::new(tv_relay),
        channels_path: PathBuf::from(&config.tv.channels_path),
    })
}

/// Bind the HTTP listener and serve until SIGINT/SIGTERM
pub async fn run(config: &Config) -> Result<()> {
    let state = build_state(config)?;
    let router = create_router(state, config.server.static_dir.as_deref().map(Path::new));

    let http_addr = config.http_address();
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .map_err(|e| {
            error!("Failed to bind HTTP address {}: {}", http_addr, e);
            anyhow::anyhow!("Failed to bind {http_addr}: {e}")
        })?;

    info!("HTTP server listening on {}", http_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("HTTP server error: {}", e);
            anyhow::anyhow!("HTTP server error: {e}")
        })?;

    info!("HTTP server shut down gracefully");
    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C signal");
            }
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received SIGTERM signal");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
