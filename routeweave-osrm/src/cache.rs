//! Bounded cache of raw backend responses.
//!
//! Entries are keyed by a SHA-256 fingerprint of the request path, which
//! keeps keys short regardless of how many coordinates a path carries. The
//! fingerprint only shortens lookups; it is not an authentication device.
//!
//! Concurrent requests for the same uncached path may both miss and both
//! fetch. The first response stored for a key wins and later writes for
//! that key are ignored, so a key maps to the same bytes for the life of
//! the cache.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

/// Least-recently-used store of response bodies.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<LruCache<String, Arc<[u8]>>>,
}

impl ResponseCache {
    /// Create a cache holding at most `capacity` responses.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Create a cache when `capacity` is non-zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Option<Self> {
        NonZeroUsize::new(capacity).map(Self::new)
    }

    /// Fingerprint a request path into a fixed-length cache key.
    #[must_use]
    pub fn key_for(path: &str) -> String {
        hex::encode(Sha256::digest(path.as_bytes()))
    }

    /// Look up the response stored under `key`, marking it recently used.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        self.entries.lock().get(key).cloned()
    }

    /// Store `body` under `key` unless the key is already present.
    pub fn put(&self, key: String, body: Arc<[u8]>) {
        let mut entries = self.entries.lock();
        if !entries.contains(&key) {
            entries.put(key, body);
        }
    }

    /// Number of stored responses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no responses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
