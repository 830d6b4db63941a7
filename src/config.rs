//! Configuration for the DZI server.
//!
//! Options can be set on the command line or through environment variables
//! with a `DZ_` prefix:
//!
//! - `DZ_HOST` - Server bind address (default: 127.0.0.1)
//! - `DZ_PORT` - Server port (default: 5000)
//! - `DZ_TILE_SIZE` - Deep Zoom tile size in pixels (default: 254)
//! - `DZ_OVERLAP` - Overlap of adjacent tiles in pixels (default: 1)
//! - `DZ_CACHE_SIZE` - Max open slide handles to cache (default: 30)
//! - `DZ_TILE_QUALITY` - JPEG quality for tiles (default: 75)
//! - `DZ_COLOR_MODE` - ICC color handling mode (default: "default")

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default Deep Zoom tile size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 254;

/// Default overlap of adjacent tiles in pixels.
pub const DEFAULT_OVERLAP: u32 = 1;

/// Default number of open slide handles to cache.
pub const DEFAULT_CACHE_SIZE: usize = 30;

/// Default JPEG quality for encoded tiles.
pub const DEFAULT_TILE_QUALITY: u8 = 75;

// =============================================================================
// Color Mode
// =============================================================================

/// ICC color handling mode for slides with an embedded color profile.
///
/// The four intent modes and `default` convert tile pixels to sRGB; `embed`
/// leaves pixels in the source profile and attaches the profile to each
/// tile; `ignore` strips the profile without converting.
///
/// An unrecognized mode string is rejected while parsing the configuration,
/// before the server starts.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Convert to sRGB using the profile's own default rendering intent.
    Default,
    AbsoluteColorimetric,
    RelativeColorimetric,
    Perceptual,
    Saturation,
    /// Keep source colors and embed the original profile in each tile.
    Embed,
    /// Strip the profile from tiles without converting pixels.
    Ignore,
}

// =============================================================================
// Deep Zoom Options
// =============================================================================

/// Per-server Deep Zoom pyramid parameters, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeepZoomOptions {
    /// Tile size in pixels (interior tiles are `tile_size + 2 * overlap`).
    pub tile_size: u32,

    /// Overlap of adjacent tiles in pixels.
    pub overlap: u32,

    /// Crop slides to their non-empty scan region, for backends that carry
    /// scan-bounds metadata.
    pub limit_bounds: bool,
}

impl Default for DeepZoomOptions {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            overlap: DEFAULT_OVERLAP,
            limit_bounds: true,
        }
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// DZI Server - a Deep Zoom tile server for whole-slide images.
///
/// Serves a `.dzi` descriptor and JPEG tiles for every readable slide under
/// the slide directory, with an embedded browser viewer.
#[derive(Parser, Debug, Clone)]
#[command(name = "dzi-server")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Directory containing the slide files.
    #[arg(value_name = "SLIDE-DIRECTORY", default_value = ".")]
    pub slide_dir: PathBuf,

    /// Host address to bind the server to.
    #[arg(short = 'l', long = "listen", default_value = DEFAULT_HOST, env = "DZ_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DZ_PORT")]
    pub port: u16,

    /// Deep Zoom tile size in pixels.
    #[arg(short = 's', long = "size", default_value_t = DEFAULT_TILE_SIZE, env = "DZ_TILE_SIZE")]
    pub tile_size: u32,

    /// Overlap of adjacent tiles in pixels.
    #[arg(short = 'e', long, default_value_t = DEFAULT_OVERLAP, env = "DZ_OVERLAP")]
    pub overlap: u32,

    /// Serve the entire scan area instead of cropping to the non-empty
    /// region.
    #[arg(short = 'B', long = "ignore-bounds", default_value_t = false)]
    pub ignore_bounds: bool,

    /// Maximum number of open slide handles to keep cached.
    #[arg(long, default_value_t = DEFAULT_CACHE_SIZE, env = "DZ_CACHE_SIZE")]
    pub cache_size: usize,

    /// JPEG compression quality for tiles (1-100).
    #[arg(short = 'Q', long = "quality", default_value_t = DEFAULT_TILE_QUALITY, env = "DZ_TILE_QUALITY")]
    pub tile_quality: u8,

    /// ICC color handling for slides with an embedded profile.
    #[arg(long, value_enum, default_value_t = ColorMode::Default, env = "DZ_COLOR_MODE")]
    pub color_mode: ColorMode,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }

        if self.overlap >= self.tile_size {
            return Err("overlap must be smaller than tile_size".to_string());
        }

        if self.cache_size == 0 {
            return Err("cache_size must be greater than 0".to_string());
        }

        if self.tile_quality == 0 || self.tile_quality > 100 {
            return Err("tile_quality must be between 1 and 100".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether slides should be cropped to their non-empty scan region.
    pub fn limit_bounds(&self) -> bool {
        !self.ignore_bounds
    }

    /// The Deep Zoom pyramid parameters derived from this configuration.
    pub fn deepzoom_options(&self) -> DeepZoomOptions {
        DeepZoomOptions {
            tile_size: self.tile_size,
            overlap: self.overlap,
            limit_bounds: self.limit_bounds(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            slide_dir: PathBuf::from("."),
            host: "127.0.0.1".to_string(),
            port: 5000,
            tile_size: 254,
            overlap: 1,
            ignore_bounds: false,
            cache_size: 30,
            tile_quality: 75,
            color_mode: ColorMode::Default,
            verbose: false,
            no_tracing: false,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_tile_size() {
        let mut config = test_config();
        config.tile_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlap_must_stay_below_tile_size() {
        let mut config = test_config();
        config.overlap = 254;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_cache_size() {
        let mut config = test_config();
        config.cache_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_tile_quality() {
        let mut config = test_config();
        config.tile_quality = 0;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.tile_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:5000");
    }

    #[test]
    fn test_limit_bounds_inverts_flag() {
        let mut config = test_config();
        assert!(config.limit_bounds());
        config.ignore_bounds = true;
        assert!(!config.limit_bounds());
    }

    #[test]
    fn test_color_mode_parses_all_seven_values() {
        for mode in [
            "default",
            "absolute-colorimetric",
            "relative-colorimetric",
            "perceptual",
            "saturation",
            "embed",
            "ignore",
        ] {
            assert!(
                ColorMode::from_str(mode, true).is_ok(),
                "mode {mode} should parse"
            );
        }
        assert!(ColorMode::from_str("vivid", true).is_err());
    }
}
