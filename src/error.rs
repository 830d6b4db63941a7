use thiserror::Error;

/// Errors raised by an [`crate::source::ImageSource`] backend.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Path does not exist, escapes the slide root, or the backend rejects
    /// the format. Always surfaced to clients as not-found.
    #[error("slide not readable: {0}")]
    NotReadable(String),

    /// A region read failed after the slide was opened successfully.
    #[error("region read failed: {0}")]
    Read(String),

    /// The slide has no associated image with the requested name.
    #[error("no associated image named {0:?}")]
    MissingAssociatedImage(String),
}

/// Errors raised while resolving a slide's color transform.
#[derive(Debug, Clone, Error)]
pub enum ColorError {
    /// The embedded ICC profile could not be parsed.
    #[error("invalid embedded color profile: {0}")]
    InvalidProfile(String),

    /// Building the profile-to-sRGB conversion failed.
    #[error("failed to build color transform: {0}")]
    Transform(String),
}

/// Errors raised while opening a slide and attaching its derived metadata.
#[derive(Debug, Clone, Error)]
pub enum SlideError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Color(#[from] ColorError),
}

/// Errors from mapping a Deep Zoom tile address onto a source region.
///
/// The two variants are deliberately distinct so callers can tell which axis
/// fell off the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegionError {
    /// The tile column starts at or past the right image edge.
    #[error("tile column is entirely outside the image")]
    ColumnOutOfBounds,

    /// The tile row starts at or past the bottom image edge.
    #[error("tile row is entirely outside the image")]
    RowOutOfBounds,
}

/// Errors that can occur while servicing a descriptor or tile request.
///
/// All of these map to a client-visible 404; none are fatal to the server.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Requested Deep Zoom level outside `[1, max_level]`.
    #[error("invalid level {level} (valid range: 1-{max_level})")]
    InvalidLevel { level: u32, max_level: u32 },

    #[error(transparent)]
    Region(#[from] RegionError),

    /// Requested tile encoding other than JPEG.
    #[error("unsupported tile format {format:?} (only jpeg is supported)")]
    UnsupportedFormat { format: String },

    #[error(transparent)]
    Slide(#[from] SlideError),

    /// JPEG encoding of a finished tile failed.
    #[error("failed to encode tile: {0}")]
    Encode(String),
}

impl From<SourceError> for TileError {
    fn from(err: SourceError) -> Self {
        TileError::Slide(SlideError::Source(err))
    }
}

impl From<ColorError> for TileError {
    fn from(err: ColorError) -> Self {
        TileError::Slide(SlideError::Color(err))
    }
}
