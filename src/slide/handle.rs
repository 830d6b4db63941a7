//! Open slide handles.

use std::sync::Arc;

use image::imageops::FilterType;
use image::RgbImage;

use crate::color::{select_transform, TileTransform};
use crate::config::{ColorMode, DeepZoomOptions};
use crate::deepzoom::{best_native_level, compute_region, level_factor, max_dzi_level, TileAddress};
use crate::error::{SlideError, SourceError, TileError};
use crate::source::{ImageSource, InMemorySlide, NativeLevel, PixelSpacing};

// =============================================================================
// SourcePyramid
// =============================================================================

/// Immutable per-slide facts snapshotted from the Image Source at open
/// time.
///
/// Captured into plain fields so nothing is recomputed on cache hits.
#[derive(Debug, Clone)]
pub struct SourcePyramid {
    /// Full-resolution width in pixels.
    pub width: u32,

    /// Full-resolution height in pixels.
    pub height: u32,

    /// Native levels, ordered ascending by downsample.
    pub levels: Vec<NativeLevel>,

    /// Physical pixel spacing, if the slide carries it.
    pub spacing: Option<PixelSpacing>,

    /// Names of the slide's associated images.
    pub associated_images: Vec<String>,
}

impl SourcePyramid {
    fn from_source(source: &dyn ImageSource) -> Result<Self, SourceError> {
        let levels = source.native_levels().to_vec();
        let Some(base) = levels.first() else {
            return Err(SourceError::NotReadable(
                "slide reports no resolution levels".to_string(),
            ));
        };

        Ok(Self {
            width: base.width,
            height: base.height,
            levels,
            spacing: source.pixel_spacing(),
            associated_images: source.associated_image_names().to_vec(),
        })
    }
}

/// Derive microns-per-pixel from the reported spacing.
///
/// Average of both axes when present, else whichever axis is reported,
/// else undefined.
fn derive_mpp(spacing: Option<&PixelSpacing>) -> Option<f64> {
    let spacing = spacing?;
    let scale = spacing.unit.microns_per_unit();
    match (spacing.x, spacing.y) {
        (Some(x), Some(y)) => Some((x + y) / 2.0 * scale),
        (Some(x), None) => Some(x * scale),
        (None, Some(y)) => Some(y * scale),
        (None, None) => None,
    }
}

// =============================================================================
// SlideHandle
// =============================================================================

/// One open slide plus its derived metadata, ready to serve tiles.
pub struct SlideHandle {
    source: Box<dyn ImageSource>,
    pyramid: SourcePyramid,
    options: DeepZoomOptions,
    max_level: u32,
    filename: String,
    mpp: Option<f64>,
    transform: Arc<TileTransform>,
}

impl SlideHandle {
    /// Build a handle around a freshly opened source.
    ///
    /// Snapshots the pyramid, derives mpp, and resolves the color transform
    /// - each exactly once. Fails without side effects, so an open error
    /// never leaves a partial handle behind.
    pub fn new(
        source: Box<dyn ImageSource>,
        filename: String,
        options: DeepZoomOptions,
        color_mode: ColorMode,
    ) -> Result<Self, SlideError> {
        let pyramid = SourcePyramid::from_source(source.as_ref())?;
        let transform = Arc::new(select_transform(
            source.embedded_color_profile(),
            color_mode,
        )?);
        let mpp = derive_mpp(pyramid.spacing.as_ref());
        let max_level = max_dzi_level(pyramid.width, pyramid.height);

        Ok(Self {
            source,
            pyramid,
            options,
            max_level,
            filename,
            mpp,
            transform,
        })
    }

    /// Build a pseudo-slide handle for one of a parent slide's associated
    /// images.
    ///
    /// The image becomes a single-level in-memory pyramid; mpp and the
    /// color transform are inherited from the parent.
    pub fn associated(
        parent: &SlideHandle,
        name: &str,
        image: RgbImage,
    ) -> Result<Self, SlideError> {
        let source = Box::new(InMemorySlide::new(image, None));
        let pyramid = SourcePyramid::from_source(source.as_ref() as &dyn ImageSource)?;
        let max_level = max_dzi_level(pyramid.width, pyramid.height);

        Ok(Self {
            source,
            pyramid,
            options: parent.options,
            max_level,
            filename: name.to_string(),
            mpp: parent.mpp,
            transform: Arc::clone(&parent.transform),
        })
    }

    /// Full-resolution dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.pyramid.width, self.pyramid.height)
    }

    /// Maximum Deep Zoom level of this slide.
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Resolved file name (or associated-image name) for display.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Derived microns-per-pixel, if the slide reports spacing.
    pub fn mpp(&self) -> Option<f64> {
        self.mpp
    }

    /// The tile post-processing transform resolved for this slide.
    pub fn transform(&self) -> &TileTransform {
        &self.transform
    }

    /// Names of the associated images shipped with this slide.
    pub fn associated_image_names(&self) -> &[String] {
        &self.pyramid.associated_images
    }

    /// Decode one of the associated images.
    pub async fn associated_image(&self, name: &str) -> Result<RgbImage, SourceError> {
        self.source.associated_image(name).await
    }

    /// The DZI descriptor document for this slide.
    pub fn descriptor(&self) -> String {
        crate::deepzoom::build_dzi(
            self.pyramid.width,
            self.pyramid.height,
            self.options.tile_size,
            self.options.overlap,
        )
    }

    /// Read and render one Deep Zoom tile.
    ///
    /// Maps the address onto a source region, reads it from the best
    /// native level, and resizes to the exact target size when the chosen
    /// level's downsample does not match the requested factor. The color
    /// transform is not applied here; the tile service owns that step.
    ///
    /// # Errors
    ///
    /// - [`TileError::InvalidLevel`] if `level` is outside `[1, max_level]`
    /// - [`TileError::Region`] if the address is entirely off the image
    /// - [`TileError::Slide`] if the region read fails
    pub async fn read_tile(
        &self,
        level: u32,
        address: TileAddress,
    ) -> Result<RgbImage, TileError> {
        if level < 1 || level > self.max_level {
            return Err(TileError::InvalidLevel {
                level,
                max_level: self.max_level,
            });
        }

        let factor = level_factor(self.max_level, level);
        let region = compute_region(
            address,
            self.options.tile_size,
            self.options.overlap,
            factor,
            self.pyramid.width,
            self.pyramid.height,
        )?;

        let native = best_native_level(&self.pyramid.levels, factor as f64);
        let native_downsample = self.pyramid.levels[native].downsample;

        // The fetch is sized in the native level's grid; the residual
        // factor / native_downsample ratio is resolved by resizing below.
        let fetch_width = (region.width as f64 * factor as f64 / native_downsample) as u32;
        let fetch_height = (region.height as f64 * factor as f64 / native_downsample) as u32;

        let mut tile = self
            .source
            .read_region(
                native,
                (region.left, region.top),
                (fetch_width.max(1), fetch_height.max(1)),
            )
            .await
            .map_err(SlideError::Source)?;

        if tile.dimensions() != (region.width, region.height) {
            tile = image::imageops::resize(&tile, region.width, region.height, FilterType::Lanczos3);
        }

        Ok(tile)
    }
}

// =============================================================================
// Tests
// =============================================================================
