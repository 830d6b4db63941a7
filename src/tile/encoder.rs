//! JPEG tile encoding.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageEncoder, RgbImage};

use crate::error::TileError;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Encoder for finished tiles.
///
/// Quality is fixed per server instance; the ICC profile varies per slide
/// and is supplied by the caller from the slide's resolved transform.
#[derive(Debug, Clone, Copy)]
pub struct JpegTileEncoder {
    quality: u8,
}

impl JpegTileEncoder {
    /// Create an encoder with the given JPEG quality (clamped to 1-100).
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY),
        }
    }

    /// The quality tiles are encoded at.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a tile, embedding the ICC profile when one is supplied.
    pub fn encode(&self, tile: &RgbImage, icc_profile: Option<&[u8]>) -> Result<Bytes, TileError> {
        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, self.quality);

        if let Some(profile) = icc_profile {
            encoder
                .set_icc_profile(profile.to_vec())
                .map_err(|e| TileError::Encode(e.to_string()))?;
        }

        encoder
            .encode_image(tile)
            .map_err(|e| TileError::Encode(e.to_string()))?;

        Ok(Bytes::from(output))
    }
}

// =============================================================================
// Tests
// =============================================================================
