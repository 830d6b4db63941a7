//! Slide handles and the bounded handle cache.
//!
//! A [`SlideHandle`] wraps one open [`crate::source::ImageSource`]
//! connection together with everything derived from it exactly once at open
//! time: the pyramid snapshot, microns-per-pixel, the resolved file name,
//! and the color transform. Handles are immutable after construction and
//! shared behind `Arc`.
//!
//! The [`SlideCache`] bounds how many connections are open at once,
//! guarantees a single live handle per key, and evicts least-recently-used
//! handles when full.

mod cache;
mod handle;

pub use cache::SlideCache;
pub use handle::{SlideHandle, SourcePyramid};
