//! DZI Server - a Deep Zoom tile server for whole-slide images.
//!
//! This binary parses the configuration, wires the components together,
//! and runs the HTTP server.

use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dzi_server::{
    config::Config,
    server::{create_router, AppState, RouterConfig},
    slide::SlideCache,
    source::ImageFileOpener,
    tile::TileService,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    // A missing slide directory is a deployment mistake, not a per-request
    // condition; fail before binding.
    let slide_root = match config.slide_dir.canonicalize() {
        Ok(root) => root,
        Err(e) => {
            error!(
                "Slide directory {} is not accessible: {}",
                config.slide_dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  Slide directory: {}", slide_root.display());
    info!(
        "  Deep Zoom: tile_size={} overlap={} limit_bounds={}",
        config.tile_size,
        config.overlap,
        config.limit_bounds()
    );
    info!(
        "  Cache: {} slide handles, JPEG quality {}",
        config.cache_size, config.tile_quality
    );
    info!("  Color mode: {:?}", config.color_mode);

    let cache = SlideCache::new(
        Arc::new(ImageFileOpener::new()),
        NonZeroUsize::new(config.cache_size).expect("cache_size validated above"),
        config.deepzoom_options(),
        config.color_mode,
    );
    let service = TileService::new(cache, slide_root, config.tile_quality);

    let router_config = RouterConfig::default().with_tracing(!config.no_tracing);
    let router = create_router(AppState::new(service), router_config);

    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on http://{}", addr);
    info!("Browse slides at http://{}/", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "dzi_server=debug,tower_http=debug"
    } else {
        "dzi_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
