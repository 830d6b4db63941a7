//! The Image Source collaborator contract.
//!
//! This module defines the narrow interface through which the rest of the
//! crate consumes a slide-decoding backend: open a slide, enumerate its
//! native resolution levels, read pixel regions, and query metadata. The
//! Deep Zoom mapping, caching, and color logic never depend on which
//! concrete backend is linked in.
//!
//! Two implementations are bundled:
//!
//! - [`ImageFileOpener`] / plain images decoded via the `image` crate
//! - [`InMemorySlide`] for already-decoded pixels (associated images)

mod image_file;
mod memory;

use std::path::Path;

use async_trait::async_trait;
use image::RgbImage;

use crate::error::SourceError;

pub use image_file::ImageFileOpener;
pub use memory::InMemorySlide;

// =============================================================================
// Level and Spacing Metadata
// =============================================================================

/// One native resolution level of a slide.
///
/// Level 0 is full resolution with downsample 1.0; backends report levels
/// ordered ascending by downsample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeLevel {
    /// Width of this level in pixels.
    pub width: u32,

    /// Height of this level in pixels.
    pub height: u32,

    /// Downsample factor relative to full resolution (level 0 is 1.0).
    pub downsample: f64,
}

/// Unit of the physical pixel spacing reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpacingUnit {
    Micrometer,
    Millimeter,
    Centimeter,
}

impl SpacingUnit {
    /// Conversion factor from this unit to micrometers.
    pub fn microns_per_unit(self) -> f64 {
        match self {
            SpacingUnit::Micrometer => 1.0,
            SpacingUnit::Millimeter => 1_000.0,
            SpacingUnit::Centimeter => 10_000.0,
        }
    }
}

/// Physical pixel spacing at full resolution, when the slide carries it.
///
/// Either axis may be absent; scanners do not always report both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSpacing {
    pub unit: SpacingUnit,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

// =============================================================================
// ImageSource Trait
// =============================================================================

/// An opened slide connection.
///
/// Metadata accessors are synchronous snapshots; only pixel reads perform
/// I/O. Implementations must report at least one native level.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Native resolution levels, ordered ascending by downsample.
    fn native_levels(&self) -> &[NativeLevel];

    /// Physical pixel spacing at full resolution, if known.
    fn pixel_spacing(&self) -> Option<PixelSpacing>;

    /// Raw bytes of the embedded ICC color profile, if any.
    fn embedded_color_profile(&self) -> Option<&[u8]>;

    /// Names of the associated images shipped with the slide (label,
    /// macro, thumbnail, ...).
    fn associated_image_names(&self) -> &[String];

    /// Decode an associated image by name.
    async fn associated_image(&self, name: &str) -> Result<RgbImage, SourceError>;

    /// Read a pixel region.
    ///
    /// # Arguments
    /// * `level` - Index into [`Self::native_levels`]
    /// * `origin` - Top-left corner in full-resolution pixel coordinates
    /// * `size` - Requested output size in the chosen level's pixel grid
    ///
    /// Implementations may return fewer pixels than requested where the
    /// region touches the image boundary; callers resize the result to the
    /// exact target size.
    async fn read_region(
        &self,
        level: usize,
        origin: (u32, u32),
        size: (u32, u32),
    ) -> Result<RgbImage, SourceError>;
}

// =============================================================================
// SlideOpener Trait
// =============================================================================

/// Factory for [`ImageSource`] connections.
///
/// The opener is the pluggable decoding engine: the slide cache sniffs with
/// [`SlideOpener::can_read`] before attempting an open, and performs the
/// open itself outside any lock.
#[async_trait]
pub trait SlideOpener: Send + Sync {
    /// Cheap format sniff: whether this opener recognizes the file at all.
    fn can_read(&self, path: &Path) -> bool;

    /// Open a slide, decoding enough of it to answer metadata queries.
    async fn open(&self, path: &Path) -> Result<Box<dyn ImageSource>, SourceError>;
}
