//! Pattern cache: single-flight memoization of generated masks

use crate::generator;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::debug;
use vassago_core::{AttentionMask, PatternSpec, Result};

/// Configuration for the pattern cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached masks before eviction.
    pub max_entries: usize,
    /// Maximum age of a cached mask; `None` disables age eviction.
    pub max_age: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 64,
            max_age: Some(Duration::from_secs(600)),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Total lookups.
    pub lookups: u64,
    /// Lookups served from an already-populated slot.
    pub hits: u64,
    /// Generation executions (single-flight: at most one per key).
    pub generations: u64,
    /// Entries removed by size or age eviction.
    pub evictions: u64,
    /// Current entry count.
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate over all lookups.
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }
}

struct Slot {
    cell: Arc<OnceLock<Arc<AttentionMask>>>,
    inserted: Instant,
}

/// Memoizes `(spec, sequence_length) -> AttentionMask`.
///
/// Guarantees at-most-one concurrent generation per key: the first caller
/// for an uncached key runs the generator inside the slot's once-cell,
/// and concurrent callers for the same key block on that cell rather than
/// duplicate the work. Distinct keys never contend on a global lock.
///
/// Masks are handed out as `Arc`s, so eviction can race with in-flight
/// reads safely: a reader keeps its mask alive even after the slot is
/// dropped from the index.
pub struct PatternCache {
    config: CacheConfig,
    slots: DashMap<u64, Slot>,
    lookups: AtomicU64,
    hits: AtomicU64,
    generations: AtomicU64,
    evictions: AtomicU64,
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl PatternCache {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            slots: DashMap::new(),
            lookups: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            generations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the cached mask for `(spec, sequence_length)`, generating it
    /// on first use.
    ///
    /// Invalid specs are rejected before a slot is claimed, so a slot's
    /// once-cell only ever runs an infallible build.
    pub fn get_or_generate(
        &self,
        spec: &PatternSpec,
        sequence_length: usize,
    ) -> Result<Arc<AttentionMask>> {
        generator::validate(spec, sequence_length)?;
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.purge_expired();

        let key = spec.fingerprint(sequence_length);
        // Clone the cell out of the map so no shard lock is held while the
        // generator runs; only slot creation touches the shard.
        let (cell, fresh) = match self.slots.entry(key) {
            Entry::Occupied(occupied) => (occupied.get().cell.clone(), false),
            Entry::Vacant(vacant) => {
                let slot = Slot {
                    cell: Arc::new(OnceLock::new()),
                    inserted: Instant::now(),
                };
                let cell = slot.cell.clone();
                vacant.insert(slot);
                (cell, true)
            }
        };

        let mut generated = false;
        let mask = cell
            .get_or_init(|| {
                generated = true;
                self.generations.fetch_add(1, Ordering::Relaxed);
                Arc::new(generator::build(spec, sequence_length))
            })
            .clone();
        if !generated {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        if fresh {
            self.evict_over_capacity();
        }
        Ok(mask)
    }

    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every populated entry.
    pub fn clear(&self) {
        self.slots.retain(|_, slot| slot.cell.get().is_none());
    }

    /// Snapshot of cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            generations: self.generations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.slots.len(),
        }
    }

    /// Remove entries older than the configured age. Slots whose cell is
    /// still populating are never evicted, preserving single-flight.
    fn purge_expired(&self) {
        let Some(max_age) = self.config.max_age else {
            return;
        };
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| slot.cell.get().is_none() || slot.inserted.elapsed() <= max_age);
        let removed = before.saturating_sub(self.slots.len());
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "evicted expired mask cache entries");
        }
    }

    /// Evict oldest populated entries while over capacity.
    fn evict_over_capacity(&self) {
        while self.slots.len() > self.config.max_entries {
            let oldest = self
                .slots
                .iter()
                .filter(|entry| entry.value().cell.get().is_some())
                .min_by_key(|entry| entry.value().inserted)
                .map(|entry| *entry.key());
            let Some(key) = oldest else {
                break;
            };
            self.slots.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key, "evicted mask cache entry over capacity");
        }
    }
}
