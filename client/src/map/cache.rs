//! LRU memo for relevance results

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::marker::{ClassroomMarker, ViewerMarker};
use super::relevance::{Relevance, relevance};

/// Identifies one (viewer, candidate) pair.
///
/// The viewer half hashes the fields relevance reads, so a changed viewer
/// never hits an old entry. Candidates are keyed by id only; replacing the
/// classroom list must [`RelevanceCache::clear`] the cache.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct RelevanceKey {
    pub viewer: u64,
    pub candidate: String,
}

impl RelevanceKey {
    pub fn new(viewer_signature: u64, candidate: &ClassroomMarker) -> Self {
        Self {
            viewer: viewer_signature,
            candidate: candidate.id.clone(),
        }
    }
}

/// Hash of the viewer's interests and schedule. Compute once per frame.
pub fn viewer_signature(viewer: &ViewerMarker) -> u64 {
    let mut hasher = DefaultHasher::new();
    viewer.interests.hash(&mut hasher);
    viewer.schedule.hash(&mut hasher);
    hasher.finish()
}

/// LRU cache for relevance results
pub struct RelevanceCache {
    entries: HashMap<RelevanceKey, Relevance>,
    access_order: Vec<RelevanceKey>,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

impl RelevanceCache {
    /// Create a cache holding at most `max_entries` results (0 disables caching)
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(max_entries.min(4096)),
            access_order: Vec::with_capacity(max_entries.min(4096)),
            max_entries,
            hits: 0,
            misses: 0,
        }
    }

    /// Memoized [`relevance`]. `signature` must be [`viewer_signature`] of `viewer`.
    pub fn get_or_compute(
        &mut self,
        signature: u64,
        viewer: &ViewerMarker,
        candidate: &ClassroomMarker,
    ) -> Relevance {
        let key = RelevanceKey::new(signature, candidate);

        if let Some(&level) = self.entries.get(&key) {
            self.hits += 1;
            self.update_access_order(&key);
            return level;
        }

        self.misses += 1;
        let level = relevance(viewer, candidate);
        self.insert(key, level);
        level
    }

    fn insert(&mut self, key: RelevanceKey, level: Relevance) {
        if self.max_entries == 0 {
            return;
        }

        while self.entries.len() >= self.max_entries {
            if !self.evict_oldest() {
                break;
            }
        }

        self.access_order.push(key.clone());
        self.entries.insert(key, level);
    }

    /// Evict the least recently used entry
    fn evict_oldest(&mut self) -> bool {
        if self.access_order.is_empty() {
            return false;
        }
        let oldest = self.access_order.remove(0);
        self.entries.remove(&oldest);
        log::trace!("Evicted relevance entry {:?}", oldest);
        true
    }

    fn update_access_order(&mut self, key: &RelevanceKey) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            let key = self.access_order.remove(pos);
            self.access_order.push(key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.access_order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            max_entries: self.max_entries,
            hits: self.hits,
            misses: self.misses,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RelevanceCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Cache statistics for debugging/UI
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate_percent(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f32 / total as f32) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::projection::GeoPoint;

    fn viewer() -> ViewerMarker {
        ViewerMarker::new("Us", None)
            .with_interests(["Math"])
            .with_hours("Mon", [9])
    }

    fn classroom(id: &str) -> ClassroomMarker {
        ClassroomMarker::new(id, id, GeoPoint::new(0.0, 0.0))
            .with_interests(["Math"])
            .with_hours("Mon", [9])
    }

    #[test]
    fn test_hit_after_miss() {
        let mut cache = RelevanceCache::new(8);
        let v = viewer();
        let sig = viewer_signature(&v);
        let c = classroom("a");
        assert_eq!(cache.get_or_compute(sig, &v, &c), Relevance::Perfect);
        assert_eq!(cache.get_or_compute(sig, &v, &c), Relevance::Perfect);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.hit_rate_percent(), 50.0);
    }

    #[test]
    fn test_changed_viewer_misses() {
        let mut cache = RelevanceCache::new(8);
        let c = classroom("a");
        let v = viewer();
        assert_eq!(cache.get_or_compute(viewer_signature(&v), &v, &c), Relevance::Perfect);

        let moved = ViewerMarker::new("Us", None)
            .with_interests(["Math"])
            .with_hours("Mon", [15]);
        let sig = viewer_signature(&moved);
        assert_eq!(cache.get_or_compute(sig, &moved, &c), Relevance::Partial);
    }

    #[test]
    fn test_clear_drops_candidate_edits() {
        let mut cache = RelevanceCache::new(8);
        let v = viewer();
        let sig = viewer_signature(&v);
        let c = classroom("a");
        cache.get_or_compute(sig, &v, &c);

        // Same id, new interests: keyed by id, so only a clear picks it up
        let edited = c.clone().with_interests(["Art"]);
        assert_eq!(cache.get_or_compute(sig, &v, &edited), Relevance::Perfect);
        cache.clear();
        assert_eq!(cache.get_or_compute(sig, &v, &edited), Relevance::None);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = RelevanceCache::new(2);
        let v = viewer();
        let sig = viewer_signature(&v);
        let (a, b, c) = (classroom("a"), classroom("b"), classroom("c"));
        cache.get_or_compute(sig, &v, &a);
        cache.get_or_compute(sig, &v, &b);
        // Touch a so b becomes the oldest
        cache.get_or_compute(sig, &v, &a);
        cache.get_or_compute(sig, &v, &c);
        assert_eq!(cache.len(), 2);
        assert!(cache.entries.contains_key(&RelevanceKey::new(sig, &a)));
        assert!(!cache.entries.contains_key(&RelevanceKey::new(sig, &b)));
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let mut cache = RelevanceCache::new(0);
        let v = viewer();
        cache.get_or_compute(viewer_signature(&v), &v, &classroom("a"));
        assert!(cache.is_empty());
    }
}
