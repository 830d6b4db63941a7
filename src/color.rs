//! ICC color management for tiles.
//!
//! Slides scanned on calibrated hardware embed an ICC profile describing
//! the scanner's color space. Browsers disagree on what to do with
//! profile-less images (most assume sRGB), so the server either converts
//! tile pixels to sRGB and stamps the canonical sRGB profile on every tile,
//! embeds the original profile untouched, or strips it - depending on the
//! configured [`ColorMode`].
//!
//! The conversion is built once per slide with Little CMS and shared by all
//! tile requests for that slide; per-tile work is a single in-place pixel
//! pass.

use lcms2::{DisallowCache, Flags, GlobalContext, Intent, PixelFormat, Profile, Transform};
use rgb::{FromSlice, RGB8};

use crate::config::ColorMode;
use crate::error::ColorError;

/// The per-slide tile post-processing step resolved from an embedded
/// profile and the configured color mode.
pub enum TileTransform {
    /// No embedded profile: tiles pass through untouched.
    Passthrough,

    /// Drop the profile from tiles without converting pixels.
    Strip,

    /// Keep source colors and attach the original profile to every tile.
    Embed { profile: Vec<u8> },

    /// Convert pixels to sRGB and attach the sRGB profile to every tile.
    ToSrgb {
        transform: Transform<RGB8, RGB8, GlobalContext, DisallowCache>,
        srgb_profile: Vec<u8>,
    },
}

impl TileTransform {
    /// Apply the pixel conversion, if any, to a decoded tile in place.
    pub fn apply(&self, tile: &mut image::RgbImage) {
        if let TileTransform::ToSrgb { transform, .. } = self {
            let raw: &mut [u8] = tile;
            transform.transform_in_place(raw.as_rgb_mut());
        }
    }

    /// ICC profile bytes the encoder must embed in the finished tile.
    pub fn icc_profile(&self) -> Option<&[u8]> {
        match self {
            TileTransform::Passthrough | TileTransform::Strip => None,
            TileTransform::Embed { profile } => Some(profile),
            TileTransform::ToSrgb { srgb_profile, .. } => Some(srgb_profile),
        }
    }
}

impl std::fmt::Debug for TileTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TileTransform::Passthrough => "Passthrough",
            TileTransform::Strip => "Strip",
            TileTransform::Embed { .. } => "Embed",
            TileTransform::ToSrgb { .. } => "ToSrgb",
        };
        f.write_str(name)
    }
}

/// Resolve the tile transform for a slide.
///
/// Called once when a slide handle is built, never per tile. Without an
/// embedded profile every mode degenerates to [`TileTransform::Passthrough`].
///
/// # Errors
///
/// Fails when the embedded profile cannot be parsed or the conversion to
/// sRGB cannot be built; the slide open fails and the request surfaces as
/// not-found.
pub fn select_transform(
    embedded_profile: Option<&[u8]>,
    mode: ColorMode,
) -> Result<TileTransform, ColorError> {
    let Some(bytes) = embedded_profile else {
        return Ok(TileTransform::Passthrough);
    };

    match mode {
        ColorMode::Ignore => Ok(TileTransform::Strip),
        ColorMode::Embed => Ok(TileTransform::Embed {
            profile: bytes.to_vec(),
        }),
        intent_mode => {
            let source =
                Profile::new_icc(bytes).map_err(|e| ColorError::InvalidProfile(e.to_string()))?;

            let intent = match intent_mode {
                ColorMode::Default => source.header_rendering_intent(),
                ColorMode::AbsoluteColorimetric => Intent::AbsoluteColorimetric,
                ColorMode::RelativeColorimetric => Intent::RelativeColorimetric,
                ColorMode::Perceptual => Intent::Perceptual,
                ColorMode::Saturation => Intent::Saturation,
                ColorMode::Embed | ColorMode::Ignore => unreachable!(),
            };

            let srgb = Profile::new_srgb();

            // NO_CACHE makes the transform shareable across request threads.
            let transform = Transform::new_flags_context(
                GlobalContext::new(),
                &source,
                PixelFormat::RGB_8,
                &srgb,
                PixelFormat::RGB_8,
                intent,
                Flags::NO_CACHE,
            )
            .map_err(|e| ColorError::Transform(e.to_string()))?;

            let srgb_profile = srgb
                .icc()
                .map_err(|e| ColorError::Transform(e.to_string()))?;

            Ok(TileTransform::ToSrgb {
                transform,
                srgb_profile,
            })
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn srgb_bytes() -> Vec<u8> {
        Profile::new_srgb().icc().unwrap()
    }

    #[test]
    fn test_no_profile_is_passthrough_for_every_mode() {
        for mode in [
            ColorMode::Default,
            ColorMode::Perceptual,
            ColorMode::Embed,
            ColorMode::Ignore,
        ] {
            let transform = select_transform(None, mode).unwrap();
            assert!(matches!(transform, TileTransform::Passthrough));
            assert!(transform.icc_profile().is_none());
        }
    }

    #[test]
    fn test_ignore_strips_profile_and_keeps_pixels() {
        let profile = srgb_bytes();
        let transform = select_transform(Some(&profile), ColorMode::Ignore).unwrap();
        assert!(matches!(transform, TileTransform::Strip));
        assert!(transform.icc_profile().is_none());

        let mut tile = RgbImage::from_pixel(4, 4, Rgb([10, 200, 30]));
        let original = tile.clone();
        transform.apply(&mut tile);
        assert_eq!(tile, original);
    }

    #[test]
    fn test_embed_attaches_original_profile() {
        let profile = srgb_bytes();
        let transform = select_transform(Some(&profile), ColorMode::Embed).unwrap();
        assert_eq!(transform.icc_profile(), Some(profile.as_slice()));

        let mut tile = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        let original = tile.clone();
        transform.apply(&mut tile);
        assert_eq!(tile, original);
    }

    #[test]
    fn test_intent_modes_stamp_srgb_profile() {
        let profile = srgb_bytes();
        for mode in [
            ColorMode::Default,
            ColorMode::AbsoluteColorimetric,
            ColorMode::RelativeColorimetric,
            ColorMode::Perceptual,
            ColorMode::Saturation,
        ] {
            let transform = select_transform(Some(&profile), mode).unwrap();
            assert!(matches!(transform, TileTransform::ToSrgb { .. }));
            assert!(transform.icc_profile().is_some());
        }
    }

    #[test]
    fn test_srgb_to_srgb_is_near_identity() {
        let profile = srgb_bytes();
        let transform =
            select_transform(Some(&profile), ColorMode::RelativeColorimetric).unwrap();

        let mut tile = RgbImage::from_pixel(4, 4, Rgb([128, 64, 32]));
        transform.apply(&mut tile);

        // Same source and destination space: pixels may wiggle by rounding
        // but must not change perceptibly.
        let pixel = tile.get_pixel(0, 0);
        assert!((pixel[0] as i16 - 128).abs() <= 2);
        assert!((pixel[1] as i16 - 64).abs() <= 2);
        assert!((pixel[2] as i16 - 32).abs() <= 2);
    }

    #[test]
    fn test_garbage_profile_is_rejected() {
        let result = select_transform(Some(b"not an icc profile"), ColorMode::Default);
        assert!(matches!(result, Err(ColorError::InvalidProfile(_))));
    }
}
