//! Validation result cache (§4.4): keyed by semantic key, 5 minute TTL,
//! bounded to 10 000 entries. Grounded on the teacher's Moka parse cache
//! (`drift-analysis::parsers::cache::ParseCache`).

use std::time::Duration;

use moka::sync::Cache;

use crate::decision::Decision;

pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct CachedDecision {
    pub decision: Decision,
    pub confidence: f64,
}

pub struct ValidationCache {
    inner: Cache<String, CachedDecision>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self { inner: Cache::builder().max_capacity(CACHE_CAPACITY).time_to_live(CACHE_TTL).build() }
    }

    pub fn get(&self, semantic_key: &str) -> Option<CachedDecision> {
        self.inner.get(semantic_key)
    }

    pub fn insert(&self, semantic_key: String, decision: CachedDecision) {
        self.inner.insert(semantic_key, decision);
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for ValidationCache {
    fn default() -> Self {
        Self::new()
    }
}
