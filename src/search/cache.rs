use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::config::MatchingPolicy;
use crate::index::fm::Interval;

const MASS_EPSILON: f64 = 1e-5;

/// Terminal state of the first tag sub-search, already replayed into the
/// complementary index: `fragment` is the matched residues in tag order and
/// `interval` its rows in the index that continues the search.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedCell {
    pub interval: Interval,
    pub fragment: Vec<u8>,
}

/// Identifies a cacheable (literal, mass gap) sub-search.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    pub sequence: Vec<u8>,
    pub mass: f64,
    pub turned: bool,
    pub policy: MatchingPolicy,
    pub tolerance: f64,
}

impl CacheKey {
    fn matches(&self, other: &CacheKey) -> bool {
        self.sequence == other.sequence
            && self.turned == other.turned
            && self.policy == other.policy
            && (self.mass - other.mass).abs() < MASS_EPSILON
            && (self.tolerance - other.tolerance).abs() < MASS_EPSILON
    }
}

#[derive(Debug)]
struct CacheEntry {
    key: CacheKey,
    seeds: Vec<SeedCell>,
}

/// Bounded memo of recent sub-searches, newest first. All access goes through one mutex;
/// a poisoned lock still holds a consistent list, so it is recovered rather than propagated.
#[derive(Debug)]
pub struct TagCache {
    entries: Mutex<VecDeque<CacheEntry>>,
    capacity: usize,
}

impl TagCache {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Mutex::new(VecDeque::with_capacity(capacity)), capacity }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a private copy of the cached seeds.
    pub fn get(&self, key: &CacheKey) -> Option<Vec<SeedCell>> {
        let entries = self.lock();
        let hit = entries.iter().find(|e| e.key.matches(key)).map(|e| e.seeds.clone());
        trace!(hit = hit.is_some(), cached = entries.len(), "tag cache lookup");
        hit
    }

    /// Stores `seeds` as the newest entry. A key another query stored first is left as is.
    pub fn insert(&self, key: CacheKey, seeds: &[SeedCell]) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        if entries.iter().any(|e| e.key.matches(&key)) {
            return;
        }
        entries.push_front(CacheEntry { key, seeds: seeds.to_vec() });
        while entries.len() > self.capacity {
            entries.pop_back();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
