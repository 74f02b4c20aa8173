use crate::html::{self, LevelSet, TocBuild};
use std::collections::{HashMap, VecDeque};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

/// Identifies one build: a hash of the page content together with the
/// options that affect extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    pub fn new(content: &str, levels: LevelSet, excluded: &[String]) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        levels.hash(&mut hasher);
        excluded.hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// How many builds a cache holds unless told otherwise.
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct Entries {
    builds: HashMap<CacheKey, Arc<TocBuild>>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<CacheKey>,
}

/// A lookaside cache of finished builds, shared between renders.
///
/// Entries are never modified once written. Two renders that miss on the same
/// key at once both do the work, and whichever stores its result first wins.
/// Once `capacity` builds are held, storing another evicts the oldest.
#[derive(Debug)]
pub struct BuildCache {
    capacity: usize,
    entries: RwLock<Entries>,
}

impl Default for BuildCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl BuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` builds. Zero disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::default(),
        }
    }

    pub fn get(&self, key: CacheKey) -> Option<Arc<TocBuild>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.builds.get(&key).cloned()
    }

    /// Look up a build, running it on a miss.
    pub fn get_or_build(
        &self,
        content: &str,
        levels: LevelSet,
        excluded: &[String],
    ) -> Arc<TocBuild> {
        let key = CacheKey::new(content, levels, excluded);
        if let Some(hit) = self.get(key) {
            log::debug!("build cache hit for {key:?}");
            return hit;
        }

        let built = Arc::new(html::build(content, levels, excluded));
        if self.capacity == 0 {
            return built;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(winner) = entries.builds.get(&key) {
            return Arc::clone(winner);
        }
        while entries.order.len() >= self.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.builds.remove(&oldest);
        }
        entries.order.push_back(key);
        entries.builds.insert(key, Arc::clone(&built));
        built
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .builds
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
