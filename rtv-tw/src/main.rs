//! RTV Tree Worker (rtv-tw) - Main entry point
//!
//! Background service that loads a compressed response tree once, indexes
//! it, and serves cutoff-filtered subtrees to the rendering layer over
//! HTTP/SSE.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rtv_common::cache::PayloadCache;
use rtv_common::config::{ProcessingMode, TreeConfig};
use rtv_tw::api;
use rtv_tw::worker::TreeWorker;

/// Command-line arguments for rtv-tw
#[derive(Parser, Debug)]
#[command(name = "rtv-tw")]
#[command(about = "Tree worker microservice for RTV")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5850", env = "RTV_TW_PORT")]
    port: u16,

    /// Probability cutoff below which children are hidden
    #[arg(long)]
    cutoff: Option<f64>,

    /// Sentinel end-of-text value always shown regardless of cutoff
    #[arg(long)]
    sentinel: Option<String>,

    /// Processing mode: lazy (query on demand) or eager (whole tree)
    #[arg(long)]
    mode: Option<ProcessingMode>,

    /// Payload cache database path
    #[arg(long)]
    cache_db: Option<PathBuf>,

    /// Tree source URL to load at startup
    #[arg(long, env = "RTV_TREE_URL")]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rtv_tw=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = TreeConfig::resolve(args.cutoff, args.sentinel, args.mode, args.cache_db)
        .context("Failed to resolve configuration")?;

    info!("Starting RTV Tree Worker on port {}", args.port);
    info!(
        "Cutoff: {}, mode: {:?}, cache: {}",
        config.cutoff,
        config.mode,
        config.cache_db.display()
    );

    let cache = PayloadCache::open(&config.cache_db)
        .await
        .context("Failed to open payload cache")?;

    let worker = TreeWorker::spawn(cache, config);
    info!("Tree worker spawned");

    // Kick off the initial load without holding up server startup
    if let Some(url) = args.url {
        let handle = worker.clone();
        tokio::spawn(async move {
            match handle.fetch_tree(url.clone()).await {
                Ok(_) => info!("Initial tree load complete for {}", url),
                Err(e) => error!("Initial tree load failed for {}: {}", url, e),
            }
        });
    }

    // Build the application router
    let app_state = api::AppState {
        worker,
        port: args.port,
    };
    let app = api::create_router(app_state);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
