//! Native level selection.

use crate::source::NativeLevel;

/// Pick the native level to read from for a requested downsample factor.
///
/// Returns the index of the level with the largest downsample that is still
/// strictly less than the requested factor: the least-detailed level that
/// does not lose precision. Reading a finer level and downsampling in
/// software costs a resize; reading a coarser one and upsampling would
/// blur, so the selection rounds down.
///
/// When no level qualifies (the request asks for more detail than any
/// level short of level 0 offers, or the list is degenerate), level 0 is
/// returned so tile serving degrades gracefully instead of failing.
///
/// `levels` must be ordered ascending by downsample, as reported by
/// [`crate::source::ImageSource::native_levels`].
pub fn best_native_level(levels: &[NativeLevel], downsample: f64) -> usize {
    let mut best = 0;
    for (index, level) in levels.iter().enumerate() {
        if level.downsample < downsample {
            best = index;
        }
    }
    best
}

// =============================================================================
// Tests
// =============================================================================
