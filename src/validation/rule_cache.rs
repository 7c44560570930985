//! Shared cache of built rule sets.
//!
//! Rule sets are keyed by an explicit string id and shared across validators
//! through `Arc`. Entries are type-erased so one cache can hold rule sets for
//! every value type; a lookup with the wrong type is a miss.
//!
//! Eviction is opportunistic: every insert first drops entries that have been
//! idle longer than the configured window *and* have fewer hits than
//! `min_hits`.

use crate::cache::pruning::decision::is_idle_and_cold;
use crate::validation::rules::RuleSet;
use crate::validation::validator::Validator;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Eviction settings for [`RuleSetCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleCacheConfig {
    /// Seconds an entry may sit unused before it becomes evictable.
    pub idle_window_secs: u64,
    /// Entries with at least this many hits are never evicted for idleness.
    pub min_hits: u64,
}

impl Default for RuleCacheConfig {
    fn default() -> Self {
        Self {
            idle_window_secs: 300,
            min_hits: 2,
        }
    }
}

impl RuleCacheConfig {
    pub fn idle_window(&self) -> Duration {
        Duration::seconds(i64::try_from(self.idle_window_secs).unwrap_or(i64::MAX))
    }
}

struct RuleSetEntry {
    rules: Arc<dyn Any + Send + Sync>,
    created_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
    hit_count: u64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, RuleSetEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Process-wide store of rule sets, keyed by id.
#[derive(Default)]
pub struct RuleSetCache {
    config: RuleCacheConfig,
    inner: Mutex<Inner>,
}

impl RuleSetCache {
    pub fn new(config: RuleCacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn config(&self) -> &RuleCacheConfig {
        &self.config
    }

    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<RuleSet<T>>> {
        self.get_at(key, Utc::now())
    }

    /// Look up a rule set, recording the access at `now`.
    pub fn get_at<T: Send + Sync + 'static>(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<Arc<RuleSet<T>>> {
        let mut inner = self.inner.lock();
        let found = inner.entries.get_mut(key).and_then(|entry| {
            let rules = Arc::clone(&entry.rules).downcast::<RuleSet<T>>().ok()?;
            entry.last_access = now;
            entry.hit_count += 1;
            Some(rules)
        });

        match found {
            Some(_) => inner.hits += 1,
            None => inner.misses += 1,
        }
        found
    }

    pub fn insert<T: Send + Sync + 'static>(
        &self,
        key: &str,
        rules: RuleSet<T>,
    ) -> Arc<RuleSet<T>> {
        self.insert_at(key, rules, Utc::now())
    }

    /// Store a rule set under `key`, evicting idle cold entries first.
    pub fn insert_at<T: Send + Sync + 'static>(
        &self,
        key: &str,
        rules: RuleSet<T>,
        now: DateTime<Utc>,
    ) -> Arc<RuleSet<T>> {
        let rules = Arc::new(rules);
        let mut inner = self.inner.lock();
        let evicted = Self::evict_locked(&mut inner, &self.config, now);
        if evicted > 0 {
            debug!(evicted, "Evicted idle rule sets");
        }

        inner.entries.insert(
            key.to_string(),
            RuleSetEntry {
                rules: Arc::clone(&rules) as Arc<dyn Any + Send + Sync>,
                created_at: now,
                last_access: now,
                hit_count: 0,
            },
        );
        rules
    }

    /// Reuse the rule set stored under `key`, or build, store and return it.
    pub fn get_or_build<T, F>(&self, key: &str, build: F) -> Validator<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> RuleSet<T>,
    {
        let rules = match self.get::<T>(key) {
            Some(rules) => rules,
            None => self.insert(key, build()),
        };
        Validator::new(rules).with_key(key)
    }

    /// Drop every idle cold entry as of `now`. Returns how many were removed.
    pub fn evict_idle_at(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.inner.lock();
        Self::evict_locked(&mut inner, &self.config, now)
    }

    fn evict_locked(inner: &mut Inner, config: &RuleCacheConfig, now: DateTime<Utc>) -> usize {
        let window = config.idle_window();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| {
            !is_idle_and_cold(entry.last_access, now, window, entry.hit_count, config.min_hits)
        });
        let evicted = before - inner.entries.len();
        inner.evictions += evicted as u64;
        evicted
    }

    /// When the entry under `key` was first stored.
    pub fn created_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.inner.lock().entries.get(key).map(|entry| entry.created_at)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn stats(&self) -> RuleCacheStats {
        let inner = self.inner.lock();
        RuleCacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}
