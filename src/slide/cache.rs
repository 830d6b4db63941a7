//! Bounded LRU cache of open slide handles.
//!
//! The cache is the only shared mutable state in the crate. Its invariants:
//!
//! - never more than `cache_size` entries; the bound is enforced at every
//!   insert, and eviction removes the least-recently-used entry first
//! - at most one live handle per key is ever stored
//! - a hit performs no I/O and never triggers eviction
//! - the expensive work of a miss (opening the Image Source, deriving
//!   metadata, building the color transform) happens outside the lock, so
//!   concurrent misses on different slides do not serialize on each other
//!
//! Two requests can miss on the same key at once; both open the slide, and
//! the second to reach the insert discards its handle and adopts the
//! first's. The wasted open is the price of not holding the lock across
//! slow I/O.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{ColorMode, DeepZoomOptions};
use crate::error::{SlideError, SourceError};
use crate::source::SlideOpener;

use super::SlideHandle;

/// Bounded, key-addressed cache of open slide handles.
pub struct SlideCache {
    opener: Arc<dyn SlideOpener>,
    options: DeepZoomOptions,
    color_mode: ColorMode,
    entries: Mutex<LruCache<String, Arc<SlideHandle>>>,
}

impl SlideCache {
    /// Create a cache holding at most `cache_size` open handles.
    pub fn new(
        opener: Arc<dyn SlideOpener>,
        cache_size: NonZeroUsize,
        options: DeepZoomOptions,
        color_mode: ColorMode,
    ) -> Self {
        Self {
            opener,
            options,
            color_mode,
            entries: Mutex::new(LruCache::new(cache_size)),
        }
    }

    /// The opener this cache builds handles with.
    pub fn opener(&self) -> &Arc<dyn SlideOpener> {
        &self.opener
    }

    /// Look up a cached handle, marking it most recently used.
    ///
    /// Hit-only: a miss returns `None` without side effects.
    pub async fn get(&self, key: &str) -> Option<Arc<SlideHandle>> {
        let mut entries = self.entries.lock().await;
        entries.get(key).cloned()
    }

    /// Open the slide at `path` and cache it under `key`.
    ///
    /// The format sniff, open, and metadata derivation all run outside the
    /// lock. If a concurrent request inserted the same key in the
    /// meantime, the freshly built handle is dropped and the cached one
    /// returned, so the cache never holds two handles for one key.
    pub async fn open(&self, key: &str, path: &Path) -> Result<Arc<SlideHandle>, SlideError> {
        if let Some(existing) = self.get(key).await {
            return Ok(existing);
        }

        if !self.opener.can_read(path) {
            return Err(SourceError::NotReadable(key.to_string()).into());
        }

        let source = self.opener.open(path).await.map_err(SlideError::Source)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.to_string());

        let handle = Arc::new(SlideHandle::new(
            source,
            filename,
            self.options,
            self.color_mode,
        )?);

        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.get(key) {
            // Lost the open race; first writer wins.
            debug!(key, "discarding redundant slide handle");
            return Ok(existing.clone());
        }
        entries.put(key.to_string(), handle.clone());
        Ok(handle)
    }

    /// Insert an externally built handle (an associated-image
    /// pseudo-slide) under `key`.
    ///
    /// Goes through the same bounded insert as regular opens, so the size
    /// bound and eviction order hold for pseudo-slides too. An existing
    /// entry under the key is replaced.
    pub async fn insert_external(&self, key: String, handle: Arc<SlideHandle>) {
        let mut entries = self.entries.lock().await;
        entries.put(key, handle);
    }

    /// Number of handles currently cached.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
