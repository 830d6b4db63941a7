//! In-memory single-level slide.
//!
//! Wraps an already-decoded image in the [`ImageSource`] contract so it can
//! flow through the same tile path as real slides. Used by the plain-image
//! file backend and for associated images served as pseudo-slides.

use async_trait::async_trait;
use image::RgbImage;

use crate::error::SourceError;

use super::{ImageSource, NativeLevel, PixelSpacing};

/// A fully-decoded image exposed as a one-level pyramid.
pub struct InMemorySlide {
    image: RgbImage,
    icc_profile: Option<Vec<u8>>,
    levels: [NativeLevel; 1],
    associated: [String; 0],
}

impl InMemorySlide {
    /// Wrap a decoded image, optionally keeping its embedded ICC profile.
    pub fn new(image: RgbImage, icc_profile: Option<Vec<u8>>) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            icc_profile,
            levels: [NativeLevel {
                width,
                height,
                downsample: 1.0,
            }],
            associated: [],
        }
    }
}

#[async_trait]
impl ImageSource for InMemorySlide {
    fn native_levels(&self) -> &[NativeLevel] {
        &self.levels
    }

    fn pixel_spacing(&self) -> Option<PixelSpacing> {
        None
    }

    fn embedded_color_profile(&self) -> Option<&[u8]> {
        self.icc_profile.as_deref()
    }

    fn associated_image_names(&self) -> &[String] {
        &self.associated
    }

    async fn associated_image(&self, name: &str) -> Result<RgbImage, SourceError> {
        Err(SourceError::MissingAssociatedImage(name.to_string()))
    }

    async fn read_region(
        &self,
        level: usize,
        origin: (u32, u32),
        size: (u32, u32),
    ) -> Result<RgbImage, SourceError> {
        if level != 0 {
            return Err(SourceError::Read(format!(
                "level {level} does not exist (single-level image)"
            )));
        }

        let (width, height) = self.image.dimensions();
        let (x, y) = origin;
        if x >= width || y >= height {
            return Err(SourceError::Read(format!(
                "origin ({x}, {y}) is outside the {width}x{height} image"
            )));
        }

        // Clamp to the image boundary; the caller resizes to its exact
        // target, so a short read at the edge is fine.
        let w = size.0.clamp(1, width - x);
        let h = size.1.clamp(1, height - y);

        Ok(image::imageops::crop_imm(&self.image, x, y, w, h).to_image())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[tokio::test]
    async fn test_reports_single_full_resolution_level() {
        let slide = InMemorySlide::new(gradient(64, 48), None);
        let levels = slide.native_levels();
        assert_eq!(levels.len(), 1);
        assert_eq!((levels[0].width, levels[0].height), (64, 48));
        assert_eq!(levels[0].downsample, 1.0);
    }

    #[tokio::test]
    async fn test_read_region_crops_requested_rect() {
        let slide = InMemorySlide::new(gradient(64, 48), None);
        let region = slide.read_region(0, (10, 20), (5, 4)).await.unwrap();
        assert_eq!(region.dimensions(), (5, 4));
        assert_eq!(region.get_pixel(0, 0), &Rgb([10, 20, 0]));
    }

    #[tokio::test]
    async fn test_read_region_clamps_at_edge() {
        let slide = InMemorySlide::new(gradient(64, 48), None);
        let region = slide.read_region(0, (60, 40), (16, 16)).await.unwrap();
        assert_eq!(region.dimensions(), (4, 8));
    }

    #[tokio::test]
    async fn test_read_region_rejects_outside_origin() {
        let slide = InMemorySlide::new(gradient(64, 48), None);
        assert!(slide.read_region(0, (64, 0), (1, 1)).await.is_err());
        assert!(slide.read_region(1, (0, 0), (1, 1)).await.is_err());
    }

    #[tokio::test]
    async fn test_no_associated_images() {
        let slide = InMemorySlide::new(gradient(8, 8), None);
        assert!(slide.associated_image_names().is_empty());
        assert!(matches!(
            slide.associated_image("thumbnail").await,
            Err(SourceError::MissingAssociatedImage(_))
        ));
    }
}
