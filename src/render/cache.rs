use std::collections::HashMap;

use crate::foundation::core::Raster;

/// Hit/miss counters and occupancy of a [`FrameCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
    pub bytes: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Composited rasters keyed by frame index, bounded by frame count and an optional byte budget.
pub struct FrameCache {
    name: String,
    entries: HashMap<String, Raster>,
    capacity: usize,
    max_bytes: Option<usize>,
    bytes: usize,
    enabled: bool,
    hits: u64,
    misses: u64,
}

impl FrameCache {
    pub fn new(image_id: u64, capacity: usize, max_bytes: Option<usize>) -> Self {
        Self {
            name: format!("looping.frameCache.{image_id}"),
            entries: HashMap::with_capacity(capacity),
            capacity,
            max_bytes,
            bytes: 0,
            enabled: true,
            hits: 0,
            misses: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling drops every entry.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up `key`, counting a hit or miss.
    pub fn get(&mut self, key: &str) -> Option<Raster> {
        if !self.enabled {
            return None;
        }
        match self.entries.get(key) {
            Some(r) => {
                self.hits += 1;
                Some(r.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up `key` without touching the counters.
    pub fn peek(&self, key: &str) -> Option<&Raster> {
        if !self.enabled {
            return None;
        }
        self.entries.get(key)
    }

    /// Returns false when caching is disabled or the entry does not fit.
    pub fn insert(&mut self, key: String, raster: Raster) -> bool {
        if !self.enabled {
            return false;
        }
        let replaced = self.entries.get(&key).map_or(0, Raster::byte_len);
        if replaced == 0 && self.entries.len() >= self.capacity {
            return false;
        }
        let bytes = self.bytes - replaced + raster.byte_len();
        if self.max_bytes.is_some_and(|max| bytes > max) {
            tracing::debug!(cache = %self.name, key = %key, "frame exceeds cache budget");
            return false;
        }
        self.bytes = bytes;
        self.entries.insert(key, raster);
        true
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(cache = %self.name, entries = self.entries.len(), "clearing cache");
        }
        self.entries.clear();
        self.bytes = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            entries: self.entries.len(),
            bytes: self.bytes,
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cache.rs"]
mod tests;
