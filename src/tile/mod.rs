//! Tile service layer.
//!
//! [`TileService`] is the request-level orchestration: it turns a slide key
//! into a descriptor document, a viewer page model, or encoded tile bytes,
//! consulting the slide cache and applying the per-slide color transform
//! before encoding. [`JpegTileEncoder`] owns the JPEG step.

mod encoder;
mod service;

pub use encoder::JpegTileEncoder;
pub use service::{AssociatedImageRef, DirListing, SlideLink, SlidePage, TileService};
