//! Per-category metrics, stored by score fingerprint.
//!
//! `collect_metrics` always recomputes and overwrites; `get_stored_metrics`
//! is a pure lookup. The store sits behind one `RwLock` so concurrent readers
//! never see a half-written entry.
//!
//! The store is bounded by the same [`CacheSettings`] as the result cache:
//! at `max_entries` a new key displaces the oldest collection, and a sweep
//! drops collections older than `stale_after_secs`.

use crate::cache::pruning::{is_expired, needs_capacity_eviction, select_least_used, AccessRecord};
use crate::cache::{CacheSettings, Fingerprint, Sweep};
use crate::core::{Category, SubjectScores};
use crate::scoring::percentage;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Aggregate of one category against its attainable maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMetric {
    pub category: Category,
    pub total: f64,
    /// Sum of the maxima present on the category's subjects
    pub max_total: f64,
    /// `total / max_total` on a 0-100 scale; 0 when no maxima are known
    pub percentage: f64,
    pub computed_at: DateTime<Utc>,
}

pub type CategoryMetrics = BTreeMap<Category, CategoryMetric>;

/// Compute metrics for every category in `scores`.
pub fn compute_category_metrics(scores: &SubjectScores, now: DateTime<Utc>) -> CategoryMetrics {
    let mut sums: BTreeMap<Category, (f64, f64)> = BTreeMap::new();
    for (subject, entry) in scores {
        let sum = sums.entry(subject.category()).or_insert((0.0, 0.0));
        sum.0 += entry.total();
        sum.1 += entry.max_total();
    }

    sums.into_iter()
        .map(|(category, (total, max_total))| {
            let metric = CategoryMetric {
                category: category.clone(),
                total,
                max_total,
                percentage: percentage(total, max_total),
                computed_at: now,
            };
            (category, metric)
        })
        .collect()
}

struct StoredMetrics {
    metrics: CategoryMetrics,
    collected_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MetricsCollector {
    settings: CacheSettings,
    store: RwLock<HashMap<Fingerprint, StoredMetrics>>,
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("settings", &self.settings)
            .field("entries", &self.len())
            .finish()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector bounded by `settings`; `min_hits` and the sweep interval do
    /// not apply because lookups are not counted.
    pub fn with_settings(settings: CacheSettings) -> Self {
        Self {
            settings,
            store: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn collect_metrics(&self, scores: &SubjectScores) -> CategoryMetrics {
        self.collect_metrics_at(scores, Utc::now())
    }

    /// Recompute metrics for `scores` and overwrite the stored entry.
    pub fn collect_metrics_at(
        &self,
        scores: &SubjectScores,
        now: DateTime<Utc>,
    ) -> CategoryMetrics {
        self.collect_metrics_for_at(Fingerprint::of(scores), scores, now)
    }

    /// Recompute metrics for `scores` and store them under `key`.
    ///
    /// The pipeline keys by its input fingerprint, which differs from the
    /// fingerprint of `scores` when invalid subjects were dropped.
    pub fn collect_metrics_for(&self, key: Fingerprint, scores: &SubjectScores) -> CategoryMetrics {
        self.collect_metrics_for_at(key, scores, Utc::now())
    }

    pub fn collect_metrics_for_at(
        &self,
        key: Fingerprint,
        scores: &SubjectScores,
        now: DateTime<Utc>,
    ) -> CategoryMetrics {
        let metrics = compute_category_metrics(scores, now);
        debug!(
            key = %key.short_id(),
            categories = metrics.len(),
            "Collected category metrics"
        );

        let mut store = self.store.write();
        let is_new_key = !store.contains_key(&key);
        if needs_capacity_eviction(store.len(), self.settings.max_entries, is_new_key) {
            let victim = select_least_used(store.iter().map(|(k, stored)| {
                let record = AccessRecord {
                    last_access: stored.collected_at,
                    hit_count: 0,
                };
                (k, record)
            }))
            .cloned();
            if let Some(victim) = victim {
                store.remove(&victim);
                debug!(key = %victim.short_id(), "Evicted oldest metrics");
            }
        }
        store.insert(
            key,
            StoredMetrics {
                metrics: metrics.clone(),
                collected_at: now,
            },
        );
        metrics
    }

    pub fn get_stored_metrics(&self, key: &Fingerprint) -> Option<CategoryMetrics> {
        self.store.read().get(key).map(|stored| stored.metrics.clone())
    }

    /// Drop collections older than the stale window as of `now`.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let window = self.settings.stale_after();
        let mut store = self.store.write();
        let before = store.len();
        store.retain(|_, stored| !is_expired(stored.collected_at, now, window));
        let removed = before - store.len();
        if removed > 0 {
            debug!(removed, remaining = store.len(), "Swept stale metrics");
        }
        removed
    }

    pub fn clear_metrics(&self) {
        self.store.write().clear();
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }
}

impl Sweep for MetricsCollector {
    fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ScoreEntry;
    use pretty_assertions::assert_eq;

    fn scores() -> SubjectScores {
        SubjectScores::new()
            .with("英語R", ScoreEntry::new(80.0, 150.0).with_max(100.0, 200.0))
            .with("英語L", ScoreEntry::new(70.0, 0.0).with_max(100.0, 0.0))
            .with("数学", ScoreEntry::new(90.0, 120.0))
    }

    #[test]
    fn test_category_metrics() {
        let now = Utc::now();
        let metrics = compute_category_metrics(&scores(), now);

        let english = &metrics[&Category::from("英語")];
        assert_eq!(english.total, 300.0);
        assert_eq!(english.max_total, 400.0);
        assert_eq!(english.percentage, 75.0);
        assert_eq!(english.computed_at, now);

        let math = &metrics[&Category::from("数学")];
        assert_eq!(math.max_total, 0.0);
        assert_eq!(math.percentage, 0.0);
    }

    #[test]
    fn test_collect_overwrites_and_lookup_is_pure() {
        let collector = MetricsCollector::new();
        let scores = scores();
        let key = Fingerprint::of(&scores);

        assert!(collector.get_stored_metrics(&key).is_none());

        let first = collector.collect_metrics(&scores);
        assert_eq!(collector.get_stored_metrics(&key), Some(first.clone()));
        assert_eq!(collector.get_stored_metrics(&key), Some(first));
        assert_eq!(collector.len(), 1);

        let later = Utc::now() + chrono::Duration::seconds(5);
        let second = collector.collect_metrics_at(&scores, later);
        assert_eq!(collector.len(), 1);
        assert_eq!(
            collector.get_stored_metrics(&key).unwrap()[&Category::from("英語")].computed_at,
            second[&Category::from("英語")].computed_at
        );
    }

    #[test]
    fn test_store_is_bounded_by_capacity() {
        let collector = MetricsCollector::with_settings(CacheSettings {
            max_entries: 2,
            ..CacheSettings::default()
        });
        let t0 = Utc::now();
        let sheet = |score: f64| SubjectScores::new().with("数学", ScoreEntry::new(score, 0.0));

        for (i, score) in [10.0, 20.0, 30.0].into_iter().enumerate() {
            collector.collect_metrics_at(&sheet(score), t0 + chrono::Duration::seconds(i as i64));
        }

        assert_eq!(collector.len(), 2);
        assert!(collector.get_stored_metrics(&Fingerprint::of(&sheet(10.0))).is_none());
        assert!(collector.get_stored_metrics(&Fingerprint::of(&sheet(20.0))).is_some());
        assert!(collector.get_stored_metrics(&Fingerprint::of(&sheet(30.0))).is_some());
    }

    #[test]
    fn test_sweep_drops_old_collections() {
        let collector = MetricsCollector::with_settings(CacheSettings {
            stale_after_secs: 60,
            ..CacheSettings::default()
        });
        let t0 = Utc::now();
        let old = SubjectScores::new().with("数学", ScoreEntry::new(1.0, 0.0));
        let recent = SubjectScores::new().with("国語", ScoreEntry::new(1.0, 0.0));

        collector.collect_metrics_at(&old, t0);
        collector.collect_metrics_at(&recent, t0 + chrono::Duration::seconds(90));

        assert_eq!(collector.sweep_at(t0 + chrono::Duration::seconds(100)), 1);
        assert!(collector.get_stored_metrics(&Fingerprint::of(&old)).is_none());
        assert!(collector.get_stored_metrics(&Fingerprint::of(&recent)).is_some());
    }

    #[test]
    fn test_collect_for_explicit_key() {
        let collector = MetricsCollector::new();
        let key = Fingerprint::of(&SubjectScores::new().with("英語R", ScoreEntry::new(-1.0, 0.0)));

        let metrics = collector.collect_metrics_for(key.clone(), &scores());

        assert_eq!(collector.get_stored_metrics(&key), Some(metrics));
        assert!(collector.get_stored_metrics(&Fingerprint::of(&scores())).is_none());
    }

    #[test]
    fn test_clear_metrics() {
        let collector = MetricsCollector::new();
        collector.collect_metrics(&scores());
        collector.clear_metrics();
        assert!(collector.is_empty());
    }
}
