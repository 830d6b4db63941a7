//! Deep Zoom pyramid math.
//!
//! Pure, stateless functions implementing the DZI addressing model:
//!
//! - [`region`] maps a (level, column, row) tile address onto the exact
//!   full-resolution source rectangle, clipping at image edges
//! - [`level`] picks the native resolution level to read a region from
//! - [`descriptor`] builds the DZI XML document viewers bootstrap from
//!
//! Deep Zoom levels are numbered from 0 (a single pixel) up to
//! `ceil(log2(max(width, height)))` (full resolution); each level doubles
//! the pixel pitch of the one above it. Level 0 itself is never served.

pub mod descriptor;
pub mod level;
pub mod region;

pub use descriptor::build_dzi;
pub use level::best_native_level;
pub use region::{compute_region, level_factor, max_dzi_level, Region, TileAddress};
