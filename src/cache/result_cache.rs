//! Memoized pipeline results keyed by score fingerprint.
//!
//! The cache never computes anything itself: callers `get` and, on a miss,
//! compute and `set`. Stored values are handed out as `Arc`s, so two reads of
//! the same key return the same allocation.
//!
//! Two eviction policies apply:
//! - capacity: inserting a new key into a full cache first drops the entry
//!   with the fewest hits (oldest access breaks ties)
//! - staleness: [`ResultCache::sweep_at`] drops entries idle longer than
//!   `stale_after_secs` that also have fewer than `min_hits` hits
//!
//! Every read-modify-write runs under one `parking_lot::Mutex`.

use crate::cache::pruning::decision::{
    is_idle_and_cold, needs_capacity_eviction, select_least_used, AccessRecord,
};
use crate::cache::Fingerprint;
use crate::chart::ChartData;
use crate::metrics::CategoryMetrics;
use crate::scoring::ScoreSummary;
use crate::validation::ValidationError;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Limits and sweep cadence for [`ResultCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum number of stored results; 0 disables the bound.
    pub max_entries: usize,
    /// Idle time after which a cold entry is swept.
    pub stale_after_secs: u64,
    /// Entries with at least this many hits survive sweeps.
    pub min_hits: u64,
    /// How often the background sweeper runs.
    pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 128,
            stale_after_secs: 600,
            min_hits: 2,
            sweep_interval_secs: 60,
        }
    }
}

impl CacheSettings {
    pub fn stale_after(&self) -> Duration {
        Duration::seconds(i64::try_from(self.stale_after_secs).unwrap_or(i64::MAX))
    }
}

/// Score-derived results of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedScores {
    pub summary: ScoreSummary,
    pub chart: ChartData,
    pub validation_errors: Vec<ValidationError>,
}

/// What the cache stores per fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedComputation {
    pub scores: ComputedScores,
    pub metrics: CategoryMetrics,
}

struct CacheEntry {
    value: Arc<CachedComputation>,
    created_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
    hit_count: u64,
}

impl CacheEntry {
    fn access_record(&self) -> AccessRecord {
        AccessRecord {
            last_access: self.last_access,
            hit_count: self.hit_count,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cache Stats: {} entries, {} hits, {} misses, {} evictions, {:.1}% hit rate",
            self.entries,
            self.hits,
            self.misses,
            self.evictions,
            self.hit_rate * 100.0
        )
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<Fingerprint, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

pub struct ResultCache {
    settings: CacheSettings,
    inner: Mutex<Inner>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

impl fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("settings", &self.settings)
            .field("entries", &self.len())
            .finish()
    }
}

impl ResultCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn get(&self, key: &Fingerprint) -> Option<Arc<CachedComputation>> {
        self.get_at(key, Utc::now())
    }

    /// Look up `key`, recording the access at `now`.
    pub fn get_at(&self, key: &Fingerprint, now: DateTime<Utc>) -> Option<Arc<CachedComputation>> {
        let mut inner = self.inner.lock();
        let found = inner.entries.get_mut(key).map(|entry| {
            entry.last_access = now;
            entry.hit_count += 1;
            Arc::clone(&entry.value)
        });

        match found {
            Some(_) => {
                inner.hits += 1;
                debug!(key = %key.short_id(), "Result cache hit");
            }
            None => {
                inner.misses += 1;
                debug!(key = %key.short_id(), "Result cache miss");
            }
        }
        found
    }

    pub fn set(
        &self,
        key: Fingerprint,
        scores: ComputedScores,
        metrics: CategoryMetrics,
    ) -> Arc<CachedComputation> {
        self.set_at(key, scores, metrics, Utc::now())
    }

    /// Store a result under `key`, evicting the least-used entry if full.
    ///
    /// Replacing an existing key keeps its creation time and hit count.
    pub fn set_at(
        &self,
        key: Fingerprint,
        scores: ComputedScores,
        metrics: CategoryMetrics,
        now: DateTime<Utc>,
    ) -> Arc<CachedComputation> {
        let value = Arc::new(CachedComputation { scores, metrics });
        let mut inner = self.inner.lock();

        let is_new_key = !inner.entries.contains_key(&key);
        if needs_capacity_eviction(inner.entries.len(), self.settings.max_entries, is_new_key) {
            let victim = select_least_used(
                inner
                    .entries
                    .iter()
                    .map(|(k, entry)| (k, entry.access_record())),
            )
            .cloned();
            if let Some(victim) = victim {
                inner.entries.remove(&victim);
                inner.evictions += 1;
                debug!(key = %victim.short_id(), "Evicted least-used result");
            }
        }

        inner
            .entries
            .entry(key)
            .and_modify(|entry| {
                entry.value = Arc::clone(&value);
                entry.last_access = now;
            })
            .or_insert_with(|| CacheEntry {
                value: Arc::clone(&value),
                created_at: now,
                last_access: now,
                hit_count: 0,
            });
        value
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Drop entries that are both stale and cold as of `now`.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let stale_after = self.settings.stale_after();
        let min_hits = self.settings.min_hits;

        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| {
            !is_idle_and_cold(entry.last_access, now, stale_after, entry.hit_count, min_hits)
        });
        let removed = before - inner.entries.len();
        inner.evictions += removed as u64;

        if removed > 0 {
            debug!(removed, remaining = inner.entries.len(), "Swept stale results");
        }
        removed
    }

    /// Creation time and hit count of `key`, without counting as an access.
    pub fn entry_info(&self, key: &Fingerprint) -> Option<(DateTime<Utc>, u64)> {
        self.inner
            .lock()
            .entries
            .get(key)
            .map(|entry| (entry.created_at, entry.hit_count))
    }

    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let lookups = inner.hits + inner.misses;
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            hit_rate: if lookups > 0 {
                inner.hits as f64 / lookups as f64
            } else {
                0.0
            },
        }
    }
}
