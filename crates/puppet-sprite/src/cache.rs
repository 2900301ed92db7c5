//! Decode cache - bounded LRU of decoded sprites
//!
//! Entries are keyed by grid key and hold `Arc`s so a frame can keep an
//! image alive after it has been evicted. Failed decodes are never cached.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use puppet_core::{GridKey, PuppetError, PuppetResult};

use crate::SpriteIndex;

/// Default number of decoded sprites kept
pub const DEFAULT_CACHE_CAPACITY: usize = 300;

/// Decoded sprite pixels
pub type SpriteImage = image::RgbaImage;

/// Decode a sprite file to RGBA8
pub fn decode_sprite(path: &Path) -> PuppetResult<SpriteImage> {
    let img = image::open(path).map_err(|e| PuppetError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(img.to_rgba8())
}

/// Cache counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Sprites in the index at the time of the query
    pub indexed_count: usize,
    pub cached_count: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub decode_failures: u64,
}

struct Slot<T> {
    value: Arc<T>,
    stamp: u64,
}

/// LRU map of grid key to decoded value
///
/// Recency is a monotonically increasing stamp; `order` maps stamps back to
/// keys so the oldest entry is the first one in the tree.
pub struct DecodeCache<T> {
    capacity: usize,
    slots: HashMap<GridKey, Slot<T>>,
    order: BTreeMap<u64, GridKey>,
    next_stamp: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    decode_failures: u64,
}

impl<T> DecodeCache<T> {
    /// Create a cache holding at most `capacity` entries (at least 1)
    pub fn new(capacity: usize) -> Self {
        DecodeCache {
            capacity: capacity.max(1),
            slots: HashMap::new(),
            order: BTreeMap::new(),
            next_stamp: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            decode_failures: 0,
        }
    }

    /// Cached value for `key`, decoding it from the index on a miss
    ///
    /// Returns `None` if the key is not indexed or the loader fails. A
    /// failure is logged and leaves the cache unchanged.
    pub fn get_or_load<F>(&mut self, key: GridKey, index: &SpriteIndex, loader: F) -> Option<Arc<T>>
    where
        F: FnOnce(&Path) -> PuppetResult<T>,
    {
        if let Some(value) = self.get(&key) {
            self.hits += 1;
            return Some(value);
        }
        self.misses += 1;

        let path = index.get(&key)?;
        match loader(path) {
            Ok(value) => Some(self.insert(key, value)),
            Err(e) => {
                self.decode_failures += 1;
                tracing::warn!(%key, path = %path.display(), error = %e, "sprite decode failed");
                None
            }
        }
    }

    /// Look up and promote an entry
    pub fn get(&mut self, key: &GridKey) -> Option<Arc<T>> {
        let stamp = self.bump();
        let slot = self.slots.get_mut(key)?;
        self.order.remove(&slot.stamp);
        slot.stamp = stamp;
        self.order.insert(stamp, *key);
        Some(Arc::clone(&slot.value))
    }

    /// Insert or replace an entry as most recently used, evicting the least
    /// recently used one if over capacity
    pub fn insert(&mut self, key: GridKey, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let stamp = self.bump();
        if let Some(old) = self.slots.insert(
            key,
            Slot {
                value: Arc::clone(&value),
                stamp,
            },
        ) {
            self.order.remove(&old.stamp);
        }
        self.order.insert(stamp, key);

        while self.slots.len() > self.capacity {
            let Some((_, oldest)) = self.order.pop_first() else {
                break;
            };
            self.slots.remove(&oldest);
            self.evictions += 1;
            tracing::trace!(key = %oldest, "evicted sprite");
        }
        value
    }

    /// True if `key` is cached; does not promote
    pub fn contains(&self, key: &GridKey) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached keys from least to most recently used
    pub fn keys_by_recency(&self) -> Vec<GridKey> {
        self.order.values().copied().collect()
    }

    /// Drop every entry; counters are kept
    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
    }

    pub fn stats(&self, index: &SpriteIndex) -> CacheStats {
        CacheStats {
            indexed_count: index.len(),
            cached_count: self.slots.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            decode_failures: self.decode_failures,
        }
    }

    fn bump(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }
}

impl<T> Default for DecodeCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// Decode cache behind a mutex, for lookups from more than one task
///
/// The whole `get_or_load` runs under the lock, decode included.
pub struct SharedDecodeCache<T> {
    inner: Arc<Mutex<DecodeCache<T>>>,
}

impl<T> Clone for SharedDecodeCache<T> {
    fn clone(&self) -> Self {
        SharedDecodeCache {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedDecodeCache<T> {
    pub fn new(capacity: usize) -> Self {
        SharedDecodeCache {
            inner: Arc::new(Mutex::new(DecodeCache::new(capacity))),
        }
    }

    pub fn get_or_load<F>(&self, key: GridKey, index: &SpriteIndex, loader: F) -> Option<Arc<T>>
    where
        F: FnOnce(&Path) -> PuppetResult<T>,
    {
        self.inner.lock().get_or_load(key, index, loader)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn stats(&self, index: &SpriteIndex) -> CacheStats {
        self.inner.lock().stats(index)
    }
}
