/// Eviction strategy for the document buffer pool once it reaches capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictionMode {
    /// Evict the least-recently-used of a random sample (design note "sampled eviction").
    LruOnly,
    /// Evict the least-frequently-used of a random sample.
    LfuOnly,
    /// Sample by recency, break ties by frequency.
    Hybrid,
}

/// Configuration for the document buffer pool cache.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub capacity: usize,
    /// K in "pick K random keys and evict the oldest" (spec C2 sampled eviction).
    pub max_samples: usize,
    pub batch_size: usize,
    pub eviction_mode: EvictionMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1024, max_samples: 5, batch_size: 5, eviction_mode: EvictionMode::Hybrid }
    }
}
