//! Plain-image decoding backend.
//!
//! Decodes ordinary raster images (PNG, JPEG, TIFF, BMP) through the `image`
//! crate and serves them as single-level pyramids. This is the simplest
//! possible backend; a whole-slide format backend plugs into the same
//! [`SlideOpener`] seam without touching the rest of the crate.

use std::path::Path;

use async_trait::async_trait;
use image::{DynamicImage, ImageDecoder, ImageReader};

use crate::error::SourceError;

use super::{ImageSource, InMemorySlide, SlideOpener};

/// File extensions this backend recognizes, lower-case.
const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Opener for plain raster images on the local filesystem.
pub struct ImageFileOpener;

impl ImageFileOpener {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileOpener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlideOpener for ImageFileOpener {
    fn can_read(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                SUPPORTED_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    async fn open(&self, path: &Path) -> Result<Box<dyn ImageSource>, SourceError> {
        let path = path.to_path_buf();
        let display = path.display().to_string();

        // Decoding is CPU- and disk-bound; keep it off the async workers.
        let (image, icc_profile) = tokio::task::spawn_blocking(move || decode_image(&path))
            .await
            .map_err(|e| SourceError::NotReadable(format!("{display}: {e}")))?
            .map_err(|e| SourceError::NotReadable(format!("{display}: {e}")))?;

        Ok(Box::new(InMemorySlide::new(image, icc_profile)))
    }
}

/// Decode an image file, capturing any embedded ICC profile.
fn decode_image(path: &Path) -> image::ImageResult<(image::RgbImage, Option<Vec<u8>>)> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;
    let icc_profile = decoder.icc_profile().ok().flatten();
    let image = DynamicImage::from_decoder(decoder)?.into_rgb8();
    Ok((image, icc_profile))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn temp_file(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("dzs-opener-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_can_read_by_extension() {
        let opener = ImageFileOpener::new();
        assert!(opener.can_read(Path::new("slide.png")));
        assert!(opener.can_read(Path::new("scan.TIF")));
        assert!(opener.can_read(Path::new("a/b/photo.jpeg")));
        assert!(!opener.can_read(Path::new("notes.txt")));
        assert!(!opener.can_read(Path::new("no_extension")));
    }

    #[tokio::test]
    async fn test_open_decodes_png() {
        let path = temp_file("open.png");
        RgbImage::from_pixel(32, 24, Rgb([120, 40, 200]))
            .save(&path)
            .unwrap();

        let opener = ImageFileOpener::new();
        let slide = opener.open(&path).await.unwrap();
        let level = slide.native_levels()[0];
        assert_eq!((level.width, level.height), (32, 24));
        assert!(slide.embedded_color_profile().is_none());
    }

    #[tokio::test]
    async fn test_open_missing_file_is_not_readable() {
        let opener = ImageFileOpener::new();
        let result = opener.open(Path::new("/nonexistent/slide.png")).await;
        assert!(matches!(result, Err(SourceError::NotReadable(_))));
    }
}
