//! Page cache: a versioned slot map over decoded pages, with sampled-LRU eviction.
//!
//! Each slot is its own `RwLock`, so a reader blocks only behind a writer touching that one
//! page, never behind readers/writers of any other page — the map's outer lock is only ever
//! held long enough to look up or insert an `Arc`. Eviction doesn't scan every slot for the
//! true LRU victim; it samples `SAMPLE_SIZE` candidates and evicts the stalest of those,
//! trading a small chance of evicting a not-quite-coldest page for O(K) eviction cost instead
//! of O(n).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

use super::page::{Page, WASP_PAGE_SIZE};

/// Eviction samples this many candidate slots and evicts whichever was touched longest ago.
const SAMPLE_SIZE: usize = 5;

fn now_tick() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

struct CacheSlot {
    page: RwLock<Page>,
    version: AtomicU64,
    last_touch: AtomicU64,
}

/// Versioned page cache with sampled-LRU eviction, shared behind an `Arc` by callers that read
/// and write pages concurrently.
pub struct BlockCache {
    capacity: usize,
    slots: RwLock<HashMap<u64, Arc<CacheSlot>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl BlockCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Reads a page out of the cache. Returns its version alongside it so callers can detect a
    /// page that changed underneath them between a read and a later write-back.
    pub fn get(&self, page_id: u64) -> Option<(Page, u64)> {
        let slot = { self.slots.read().get(&page_id).cloned() }?;
        slot.last_touch.store(now_tick(), Ordering::Relaxed);
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some((slot.page.read().clone(), slot.version.load(Ordering::Acquire)))
    }

    /// Inserts or overwrites a cached page, evicting a sampled-LRU victim first if at capacity.
    pub fn insert(&self, page_id: u64, page: Page) {
        let existing = { self.slots.read().get(&page_id).cloned() };
        if let Some(slot) = existing {
            *slot.page.write() = page;
            slot.version.fetch_add(1, Ordering::AcqRel);
            slot.last_touch.store(now_tick(), Ordering::Relaxed);
            return;
        }
        let mut slots = self.slots.write();
        if !slots.contains_key(&page_id) && slots.len() >= self.capacity {
            self.evict_one(&mut slots);
        }
        slots.entry(page_id).or_insert_with(|| {
            Arc::new(CacheSlot {
                page: RwLock::new(page),
                version: AtomicU64::new(0),
                last_touch: AtomicU64::new(now_tick()),
            })
        });
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invalidate(&self, page_id: u64) {
        self.slots.write().remove(&page_id);
    }

    fn evict_one(&self, slots: &mut HashMap<u64, Arc<CacheSlot>>) {
        let candidates: Vec<(u64, u64)> = slots
            .iter()
            .take(SAMPLE_SIZE)
            .map(|(id, slot)| (*id, slot.last_touch.load(Ordering::Relaxed)))
            .collect();
        if let Some(&(victim, _)) = candidates.iter().min_by_key(|(_, touch)| *touch) {
            slots.remove(&victim);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn metrics(&self) -> WasMetrics {
        WasMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            resident: self.slots.read().len(),
            capacity: self.capacity,
        }
    }
}

/// Snapshot of `BlockCache` counters, reported via `report()` or surfaced through telemetry.
#[derive(Debug, Clone, Copy)]
pub struct WasMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub resident: usize,
    pub capacity: usize,
}

impl WasMetrics {
    pub fn report(&self) {
        let total = self.hits + self.misses;
        let hit_rate = if total == 0 { 0.0 } else { (self.hits as f64 / total as f64) * 100.0 };
        log::info!(
            "page cache: {}/{} resident, {:.1}% hit rate, {} evictions",
            self.resident,
            self.capacity,
            hit_rate,
            self.evictions
        );
    }
}

/// Reads `ids` into `cache` ahead of a sequential scan, skipping any already resident.
pub fn prefetch_pages(
    ids: &[u64],
    file: &mut std::fs::File,
    cache: &Arc<BlockCache>,
) -> std::io::Result<()> {
    use std::io::{Read, Seek, SeekFrom};
    use bincode::config::standard;
    use bincode::serde::decode_from_slice;

    let mut buf = vec![0u8; WASP_PAGE_SIZE];
    for &page_id in ids {
        if cache.get(page_id).is_some() {
            continue;
        }
        let offset = 2 * WASP_PAGE_SIZE as u64 + page_id.saturating_sub(1) * WASP_PAGE_SIZE as u64;
        file.seek(SeekFrom::Start(offset))?;
        if file.read_exact(&mut buf).is_err() {
            continue;
        }
        if let Ok((page, _)) = decode_from_slice::<Page, _>(&buf, standard()) {
            cache.insert(page_id, page);
        }
    }
    Ok(())
}

/// Hook to batch manifest updates per flip; currently immediate for durability.
pub const fn optimize_manifest_updates() {}
