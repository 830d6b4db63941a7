//! Router construction and slide-request parsing.

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{index_handler, slide_handler, AppState};

// =============================================================================
// Slide Request Parsing
// =============================================================================

/// A classified slide request, parsed from the wildcard path.
///
/// Deep Zoom clients derive tile URLs from the descriptor URL by fixed
/// convention (`name.dzi` -> `name_files/level/col_row.format`), so the
/// three request kinds share a single route and are told apart here. A
/// slide key may itself contain `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideRequest<'a> {
    /// `{slide}.dzi`
    Descriptor { slide: &'a str },

    /// `{slide}_files/{level}/{col}_{row}.{format}`
    Tile {
        slide: &'a str,
        level: u32,
        col: u32,
        row: u32,
        format: &'a str,
    },

    /// Anything else: the viewer page for `{slide}`.
    Viewer { slide: &'a str },
}

/// Classify a request path (without leading slash) into a slide request.
pub fn parse_slide_request(path: &str) -> SlideRequest<'_> {
    if let Some(slide) = path.strip_suffix(".dzi") {
        return SlideRequest::Descriptor { slide };
    }
    if let Some(tile) = parse_tile_path(path) {
        return tile;
    }
    SlideRequest::Viewer { slide: path }
}

/// Parse `{slide}_files/{level}/{col}_{row}.{format}`, if the path has
/// that shape.
fn parse_tile_path(path: &str) -> Option<SlideRequest<'_>> {
    // The slide key may contain "_files/" itself; the tile suffix is the
    // last occurrence.
    let (slide, tail) = path.rsplit_once("_files/")?;

    let (level, name) = tail.split_once('/')?;
    if name.contains('/') {
        return None;
    }

    let level = level.parse().ok()?;
    let (coords, format) = name.rsplit_once('.')?;
    let (col, row) = coords.split_once('_')?;

    Some(SlideRequest::Tile {
        slide,
        level,
        col: col.parse().ok()?,
        row: row.parse().ok()?,
        format,
    })
}

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin).
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing.
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
        }
    }
}

impl RouterConfig {
    /// Set specific allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/", get(index_handler))
        .route("/{*path}", get(slide_handler))
        .with_state(state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) => {
            let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
