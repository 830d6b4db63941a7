//! HTTP request handlers and error mapping.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::deepzoom::TileAddress;
use crate::error::{SlideError, TileError};
use crate::tile::TileService;

use super::routes::{parse_slide_request, SlideRequest};
use super::viewer;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The tile service processing all slide requests.
    pub service: Arc<TileService>,
}

impl AppState {
    pub fn new(service: TileService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// JSON error body returned with every error status.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g. "not_found").
    pub error: String,

    /// Human-readable error message.
    pub message: String,
}

/// Convert TileError to an HTTP response.
///
/// Every per-request error surfaces as 404: a missing slide, a level or
/// address off the pyramid, and an unsupported encoding are all equally
/// "no such tile" to a Deep Zoom client. Processing failures are logged
/// loudly before being flattened; nothing here is fatal to the server.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        match &self {
            TileError::Encode(_) | TileError::Slide(SlideError::Color(_)) => {
                error!("tile processing failed: {self}");
            }
            _ => {
                debug!("not found: {self}");
            }
        }

        let body = ErrorResponse {
            error: "not_found".to_string(),
            message: self.to_string(),
        };
        (StatusCode::NOT_FOUND, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /` - directory index of readable slides.
pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let listing = state.service.directory_listing().await;
    Html(viewer::render_index(&listing))
}

/// `GET /{*path}` - descriptor, tile, or viewer page.
///
/// The wildcard covers all three slide routes; [`parse_slide_request`]
/// decides which one this is.
pub async fn slide_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, TileError> {
    match parse_slide_request(&path) {
        SlideRequest::Descriptor { slide } => {
            let xml = state.service.get_descriptor(slide).await?;
            Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
        }
        SlideRequest::Tile {
            slide,
            level,
            col,
            row,
            format,
        } => {
            let bytes = state
                .service
                .get_tile(slide, level, TileAddress::new(col, row), format)
                .await?;
            Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
        }
        SlideRequest::Viewer { slide } => {
            let page = state.service.slide_page(slide).await?;
            Ok(Html(viewer::render_slide_page(&page)).into_response())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
