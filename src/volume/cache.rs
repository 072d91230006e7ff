//! Bounded LRU cache in front of an [`ExtentProvider`].
//!
//! Reading a header is cheap compared to loading a volume, but sampling
//! hundreds of draws over a handful of items asks for the same extents over
//! and over. The cache is owned by whoever constructs it; there is no
//! process-wide state.
//!
//! The cache key is `(item, orientation)`. Eligible-item listings are not
//! cached because datasets may change between requests.

use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;

use super::ExtentProvider;
use crate::types::{ItemId, Orientation};

/// Configuration for the extent cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_024,
            enabled: true,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Current number of entries in the cache.
    pub len: usize,
    /// Maximum capacity of the cache.
    pub cap: usize,
}

/// Extent provider wrapper with optional LRU caching.
///
/// Thread-safe. Every lookup takes the write lock, since a hit refreshes the
/// entry's recency.
pub struct ExtentCache<P: ExtentProvider> {
    inner: P,
    cache: Option<RwLock<LruCache<(ItemId, Orientation), u32>>>,
}

impl<P: ExtentProvider> ExtentCache<P> {
    /// Wrap a provider with the default configuration.
    pub fn new(inner: P) -> Self {
        Self::with_config(inner, CacheConfig::default())
    }

    /// Wrap a provider with a custom configuration.
    pub fn with_config(inner: P, config: CacheConfig) -> Self {
        let cache = if config.enabled {
            let size = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
            Some(RwLock::new(LruCache::new(size)))
        } else {
            None
        };

        Self { inner, cache }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Get cache statistics.
    ///
    /// Returns `None` if caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| {
            let cache = cache.read();
            CacheStats {
                len: cache.len(),
                cap: cache.cap().get(),
            }
        })
    }

    /// Clear the cache.
    ///
    /// Does nothing if caching is disabled.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }
}

impl<P: ExtentProvider> ExtentProvider for ExtentCache<P> {
    type Error = P::Error;

    fn eligible_items(&self) -> Result<Vec<ItemId>, Self::Error> {
        self.inner.eligible_items()
    }

    fn extent(&self, item: &ItemId, orientation: Orientation) -> Result<u32, Self::Error> {
        let key = (item.clone(), orientation);

        if let Some(cache) = &self.cache {
            if let Some(&extent) = cache.write().get(&key) {
                return Ok(extent);
            }
        }

        let extent = self.inner.extent(item, orientation)?;

        // Errors are not cached; a missing item may appear later
        if let Some(cache) = &self.cache {
            cache.write().put(key, extent);
        }

        Ok(extent)
    }
}
