//! Request-level orchestration.
//!
//! The service owns the slide root, the handle cache, and the encoder, and
//! exposes the three operations the HTTP layer needs: descriptor, tile,
//! and viewer-page model. Slides are addressed by their URL-side key (the
//! path relative to the slide root); associated images of a slide are
//! registered under `{key}_{name}` pseudo-keys and served through the same
//! tile path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::warn;

use crate::deepzoom::TileAddress;
use crate::error::{SlideError, SourceError, TileError};
use crate::slide::{SlideCache, SlideHandle};

use super::encoder::JpegTileEncoder;

// =============================================================================
// Page Models
// =============================================================================

/// A registered associated-image pseudo-slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedImageRef {
    /// Associated image name as reported by the slide (label, macro, ...).
    pub name: String,

    /// Cache key the pseudo-slide is served under.
    pub key: String,
}

/// Model for a slide viewer page.
#[derive(Debug, Clone)]
pub struct SlidePage {
    pub key: String,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub mpp: Option<f64>,
    pub associated: Vec<AssociatedImageRef>,
}

/// One readable slide in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideLink {
    pub name: String,

    /// Slide key, i.e. the path relative to the slide root with `/`
    /// separators.
    pub key: String,
}

/// Recursive directory listing of readable slides.
#[derive(Debug, Clone, Default)]
pub struct DirListing {
    pub name: String,
    pub directories: Vec<DirListing>,
    pub slides: Vec<SlideLink>,
}

impl DirListing {
    /// Whether the subtree contains any readable slide.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty() && self.directories.is_empty()
    }
}

// =============================================================================
// Tile Service
// =============================================================================

/// Orchestrates descriptor and tile requests against the slide cache.
pub struct TileService {
    cache: SlideCache,
    slide_root: PathBuf,
    encoder: JpegTileEncoder,
}

impl TileService {
    /// Create a service rooted at `slide_root`.
    ///
    /// The root is canonicalized once so that per-request containment
    /// checks compare resolved paths.
    pub fn new(cache: SlideCache, slide_root: PathBuf, tile_quality: u8) -> Self {
        let slide_root = slide_root.canonicalize().unwrap_or(slide_root);
        Self {
            cache,
            slide_root,
            encoder: JpegTileEncoder::new(tile_quality),
        }
    }

    /// The canonicalized slide root directory.
    pub fn slide_root(&self) -> &Path {
        &self.slide_root
    }

    /// Fetch the slide for `key`, opening and caching it on first use.
    ///
    /// One lookup, one failure path: the cache is consulted by key (which
    /// also finds pseudo-slides that have no backing file), and only on a
    /// miss is the key resolved to a filesystem path under the slide root.
    pub async fn fetch(&self, key: &str) -> Result<Arc<SlideHandle>, SlideError> {
        if let Some(handle) = self.cache.get(key).await {
            return Ok(handle);
        }
        let path = self.resolve(key)?;
        self.cache.open(key, &path).await
    }

    /// Resolve a slide key to a path inside the slide root.
    ///
    /// Anything that does not exist or escapes the root (via `..` or
    /// symlinks) is NotReadable, indistinguishable from a missing slide.
    fn resolve(&self, key: &str) -> Result<PathBuf, SourceError> {
        let joined = self.slide_root.join(key);
        let resolved = joined
            .canonicalize()
            .map_err(|_| SourceError::NotReadable(key.to_string()))?;

        if !resolved.starts_with(&self.slide_root) {
            return Err(SourceError::NotReadable(key.to_string()));
        }
        Ok(resolved)
    }

    /// Serve the DZI descriptor for a slide.
    pub async fn get_descriptor(&self, key: &str) -> Result<String, TileError> {
        let handle = self.fetch(key).await?;
        Ok(handle.descriptor())
    }

    /// Serve one encoded tile.
    ///
    /// Validates the requested encoding, reads and renders the tile, then
    /// applies the slide's color transform and encodes at the configured
    /// quality with the transform's ICC bytes attached.
    pub async fn get_tile(
        &self,
        key: &str,
        level: u32,
        address: TileAddress,
        format: &str,
    ) -> Result<Bytes, TileError> {
        if !format.eq_ignore_ascii_case("jpeg") {
            return Err(TileError::UnsupportedFormat {
                format: format.to_string(),
            });
        }

        let handle = self.fetch(key).await?;
        let mut tile = handle.read_tile(level, address).await?;

        handle.transform().apply(&mut tile);
        self.encoder.encode(&tile, handle.transform().icc_profile())
    }

    /// Build the viewer-page model for a slide, registering its associated
    /// images as pseudo-slides.
    pub async fn slide_page(&self, key: &str) -> Result<SlidePage, TileError> {
        let handle = self.fetch(key).await?;
        let associated = self.register_associated(key, &handle).await;
        let (width, height) = handle.dimensions();

        Ok(SlidePage {
            key: key.to_string(),
            filename: handle.filename().to_string(),
            width,
            height,
            mpp: handle.mpp(),
            associated,
        })
    }

    /// Register each associated image of `handle` as a pseudo-slide.
    ///
    /// Failures to decode an individual associated image skip that image
    /// rather than failing the page.
    async fn register_associated(
        &self,
        key: &str,
        handle: &Arc<SlideHandle>,
    ) -> Vec<AssociatedImageRef> {
        let mut refs = Vec::new();
        for name in handle.associated_image_names() {
            let image = match handle.associated_image(name).await {
                Ok(image) => image,
                Err(e) => {
                    warn!(slide = key, image = %name, "skipping associated image: {e}");
                    continue;
                }
            };
            match SlideHandle::associated(handle, name, image) {
                Ok(pseudo) => {
                    let pseudo_key = format!("{key}_{name}");
                    self.cache
                        .insert_external(pseudo_key.clone(), Arc::new(pseudo))
                        .await;
                    refs.push(AssociatedImageRef {
                        name: name.clone(),
                        key: pseudo_key,
                    });
                }
                Err(e) => {
                    warn!(slide = key, image = %name, "skipping associated image: {e}");
                }
            }
        }
        refs
    }

    /// Walk the slide root and list every readable slide.
    ///
    /// Directories without any readable slide are pruned, as are entries
    /// the opener does not recognize.
    pub async fn directory_listing(&self) -> DirListing {
        let root = self.slide_root.clone();
        let opener = Arc::clone(self.cache.opener());
        tokio::task::spawn_blocking(move || scan_directory(&root, Path::new(""), opener.as_ref()))
            .await
            .unwrap_or_default()
    }
}

fn scan_directory(
    root: &Path,
    relative: &Path,
    opener: &dyn crate::source::SlideOpener,
) -> DirListing {
    let mut listing = DirListing {
        name: relative
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        ..Default::default()
    };

    let Ok(entries) = std::fs::read_dir(root.join(relative)) else {
        return listing;
    };

    let mut paths: Vec<_> = entries.flatten().map(|entry| entry.path()).collect();
    paths.sort();

    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let child_relative = relative.join(&name);

        if path.is_dir() {
            let child = scan_directory(root, &child_relative, opener);
            if !child.is_empty() {
                listing.directories.push(child);
            }
        } else if opener.can_read(&path) {
            let key = child_relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            listing.slides.push(SlideLink { name, key });
        }
    }

    listing
}

// =============================================================================
// Tests
// =============================================================================
