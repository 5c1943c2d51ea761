use crate::cache::config::{CacheConfig, EvictionMode};
use crate::cache::metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::cache::size::approximate_doc_size;
use crate::document::Document;
use crate::types::DocumentId;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// A thread-safe, in-memory document buffer pool with sampled LRU/LFU eviction (design note
/// "Global pools" reused here for the document layer rather than the raw page layer).
#[derive(Clone)]
pub struct Cache {
    pub store: Arc<RwLock<LruCache<DocumentId, Document>>>,
    pub config: Arc<RwLock<CacheConfig>>, // runtime adjustable
    pub metrics: Arc<CacheMetrics>,
    eviction_lock: Arc<Mutex<()>>,
    pub(crate) freq: Arc<RwLock<HashMap<DocumentId, u64>>>,
    pub(crate) sizes: Arc<RwLock<HashMap<DocumentId, usize>>>,
}

impl Cache {
    /// Creates a new cache with a given capacity.
    pub fn new(capacity: usize) -> Self {
        Self::new_with_config(CacheConfig { capacity, ..Default::default() })
    }

    /// Creates a new cache with the provided configuration.
    pub fn new_with_config(config: CacheConfig) -> Self {
        Cache {
            store: Arc::new(RwLock::new(LruCache::new(
                NonZeroUsize::new(config.capacity.max(1))
                    .unwrap_or_else(|| NonZeroUsize::new(1).expect("NonZeroUsize(1) must exist")),
            ))),
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(CacheMetrics::default()),
            eviction_lock: Arc::new(Mutex::new(())),
            freq: Arc::new(RwLock::new(HashMap::new())),
            sizes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Inserts a document into the cache.
    pub fn insert(&self, document: Document) {
        let start = std::time::Instant::now();
        self.enforce_capacity();

        let approx = approximate_doc_size(&document);
        {
            let mut sizes = self.sizes.write();
            if let Some(prev) = sizes.insert(document.id, approx) {
                self.metrics
                    .memory_bytes
                    .fetch_sub(crate::utils::num::usize_to_u64(prev), Ordering::Relaxed);
            }
            self.metrics
                .memory_bytes
                .fetch_add(crate::utils::num::usize_to_u64(approx), Ordering::Relaxed);
            crate::dev6!(
                "{{\"bench\":\"cache\",\"op\":\"mem_add\",\"bytes\":{}}}",
                crate::utils::num::usize_to_u64(approx)
            );
        }

        let id = document.id;
        self.store.write().put(id, document);
        self.freq.write().insert(id, 1);
        self.metrics.inserts.fetch_add(1, Ordering::Relaxed);
        self.metrics.total_insert_ns.fetch_add(
            crate::utils::num::usize_to_u64(start.elapsed().as_nanos() as usize),
            Ordering::Relaxed,
        );
    }

    /// Retrieves a document from the cache.
    pub fn get(&self, id: &DocumentId) -> Option<Document> {
        let start = std::time::Instant::now();
        let mut guard = self.store.write();
        let result = if let Some(doc) = guard.get(id) {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            let mut f = self.freq.write();
            *f.entry(*id).or_insert(0) += 1;
            Some(doc.clone())
        } else {
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            None
        };
        self.metrics.total_get_ns.fetch_add(
            crate::utils::num::usize_to_u64(start.elapsed().as_nanos() as usize),
            Ordering::Relaxed,
        );
        result
    }

    /// Removes a document from the cache.
    pub fn remove(&self, id: &DocumentId) -> Option<Document> {
        let start = std::time::Instant::now();
        let removed = self.store.write().pop(id);
        if removed.is_some() {
            self.metrics.removes.fetch_add(1, Ordering::Relaxed);
            if let Some(sz) = self.sizes.write().remove(id) {
                let sz64 = crate::utils::num::usize_to_u64(sz);
                self.metrics.memory_bytes.fetch_sub(sz64, Ordering::Relaxed);
                crate::dev6!("{{\"bench\":\"cache\",\"op\":\"mem_free\",\"bytes\":{}}}", sz64);
            }
            self.freq.write().remove(id);
        }
        self.metrics.total_remove_ns.fetch_add(
            crate::utils::num::usize_to_u64(start.elapsed().as_nanos() as usize),
            Ordering::Relaxed,
        );
        removed
    }

    /// Clears the cache.
    pub fn clear(&self) {
        self.store.write().clear();
    }

    /// Get a snapshot of metrics.
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn set_eviction_mode(&self, mode: EvictionMode) {
        self.config.write().eviction_mode = mode;
    }

    pub fn set_max_samples(&self, samples: usize) {
        self.config.write().max_samples = samples.max(1);
    }

    pub fn set_batch_size(&self, batch: usize) {
        self.config.write().batch_size = batch.max(1);
    }

    pub fn set_capacity(&self, capacity: usize) {
        let nz = NonZeroUsize::new(capacity.max(1))
            .unwrap_or_else(|| NonZeroUsize::new(1).expect("NonZeroUsize(1) must exist"));
        self.config.write().capacity = nz.get();
        self.store.write().resize(nz);
    }

    /// Ensures capacity by evicting via sampled LRU/LFU/Hybrid.
    fn enforce_capacity(&self) {
        let _lock = self.eviction_lock.lock();

        let mut needed;
        {
            let guard = self.store.read();
            let cap = guard.cap().get();
            let len = guard.len();
            if len < cap {
                return;
            }
            needed = (len + 1).saturating_sub(cap);
        }

        let mut cache = self.store.write();
        let mode = self.config.read().eviction_mode;
        let mut freed_bytes_total: u64 = 0;
        while needed > 0 && !cache.is_empty() {
            let batch_size = self.config.read().batch_size.min(needed);
            let max_samples = self.config.read().max_samples;

            let keys: Vec<DocumentId> = cache.iter().map(|(k, _)| *k).collect();
            if keys.is_empty() {
                break;
            }

            let sample_count = keys.len().min(max_samples);
            let candidates: Vec<DocumentId> =
                (0..sample_count).map(|i| keys[keys.len() - 1 - i]).collect();

            let victims: Vec<DocumentId> = match mode {
                EvictionMode::LruOnly => candidates.into_iter().take(batch_size).collect(),
                EvictionMode::LfuOnly | EvictionMode::Hybrid => {
                    let freq_map = self.freq.read();
                    let mut scored: Vec<(u64, DocumentId)> = candidates
                        .into_iter()
                        .map(|k| (*freq_map.get(&k).unwrap_or(&0), k))
                        .collect();
                    scored.sort_by_key(|(f, _)| *f);
                    scored.into_iter().take(batch_size).map(|(_, k)| k).collect()
                }
            };

            let mut evicted_this_round = 0usize;
            for key in victims {
                if cache.pop(&key).is_some() {
                    self.metrics.lru_evictions.fetch_add(1, Ordering::Relaxed);
                    if let Some(sz) = self.sizes.write().remove(&key) {
                        let sz64 = crate::utils::num::usize_to_u64(sz);
                        self.metrics.memory_bytes.fetch_sub(sz64, Ordering::Relaxed);
                        freed_bytes_total = freed_bytes_total.saturating_add(sz64);
                    }
                    self.freq.write().remove(&key);
                    evicted_this_round += 1;
                    needed = needed.saturating_sub(1);
                    if needed == 0 {
                        break;
                    }
                }
            }
            if evicted_this_round == 0 {
                break;
            }
        }
        if freed_bytes_total > 0 {
            crate::dev6!(
                "{{\"bench\":\"cache\",\"op\":\"lru_summary\",\"freed_bytes\":{}}}",
                freed_bytes_total
            );
        }
    }
}
