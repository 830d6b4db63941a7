//! # DZI Server
//!
//! A Deep Zoom (DZI) tile server for multi-resolution whole-slide images.
//!
//! Zoomable-image viewers bootstrap from a `.dzi` descriptor and then
//! request tiles by `(level, column, row)`. This library maps each Deep
//! Zoom address onto the correct region and resolution of the underlying
//! slide, reads the region through a pluggable Image Source backend,
//! applies ICC color management, and encodes JPEG tiles - keeping a
//! bounded LRU cache of open slide handles in between.
//!
//! ## Architecture
//!
//! - [`deepzoom`] - pure pyramid math: region mapping, level selection,
//!   the DZI descriptor
//! - [`source`] - the Image Source contract and the bundled plain-image
//!   backend
//! - [`color`] - per-slide ICC transform selection
//! - [`slide`] - open slide handles and the bounded handle cache
//! - [`tile`] - request orchestration and JPEG encoding
//! - [`server`] - axum routes, handlers, and viewer pages
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//!
//! use dzi_server::config::{ColorMode, DeepZoomOptions};
//! use dzi_server::server::{create_router, AppState, RouterConfig};
//! use dzi_server::slide::SlideCache;
//! use dzi_server::source::ImageFileOpener;
//! use dzi_server::tile::TileService;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = SlideCache::new(
//!         Arc::new(ImageFileOpener::new()),
//!         NonZeroUsize::new(30).unwrap(),
//!         DeepZoomOptions::default(),
//!         ColorMode::Default,
//!     );
//!     let service = TileService::new(cache, "slides".into(), 75);
//!     let router = create_router(AppState::new(service), RouterConfig::default());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod color;
pub mod config;
pub mod deepzoom;
pub mod error;
pub mod server;
pub mod slide;
pub mod source;
pub mod tile;

// Re-export commonly used types
pub use color::{select_transform, TileTransform};
pub use config::{ColorMode, Config, DeepZoomOptions};
pub use deepzoom::{
    best_native_level, build_dzi, compute_region, level_factor, max_dzi_level, Region, TileAddress,
};
pub use error::{ColorError, RegionError, SlideError, SourceError, TileError};
pub use server::{create_router, parse_slide_request, AppState, RouterConfig, SlideRequest};
pub use slide::{SlideCache, SlideHandle, SourcePyramid};
pub use source::{
    ImageFileOpener, ImageSource, InMemorySlide, NativeLevel, PixelSpacing, SlideOpener,
    SpacingUnit,
};
pub use tile::{JpegTileEncoder, TileService};
