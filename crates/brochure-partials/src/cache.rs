//! Short-lived cache of the schema used to validate each partial's props.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::schema::PropSchema;

/// Default freshness window for cache entries.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Hit and miss counters since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
struct CacheEntry {
    schema: Arc<PropSchema>,
    recorded_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

/// Remembers which schema object validated a partial most recently.
///
/// An entry is reused only while it points at the very schema the partial
/// currently has and is younger than the TTL. The cache never changes a
/// validation outcome.
#[derive(Debug)]
pub(crate) struct ValidationCache {
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl ValidationCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Schema to validate `name` with, given the partial's current schema.
    pub(crate) fn schema_for(&self, name: &str, current: &Arc<PropSchema>) -> Arc<PropSchema> {
        let mut state = self.state.lock();

        if let Some(entry) = state.entries.get(name) {
            if Arc::ptr_eq(&entry.schema, current) && entry.recorded_at.elapsed() < self.ttl {
                let schema = Arc::clone(&entry.schema);
                state.stats.hits += 1;
                return schema;
            }
        }

        state.entries.insert(
            name.to_string(),
            CacheEntry {
                schema: Arc::clone(current),
                recorded_at: Instant::now(),
            },
        );
        state.stats.misses += 1;
        Arc::clone(current)
    }

    pub(crate) fn invalidate(&self, name: &str) {
        self.state.lock().entries.remove(name);
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.state.lock().entries.contains_key(name)
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }
}
