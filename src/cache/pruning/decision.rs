//! Pure eviction decision logic
//!
//! Both the result cache and the rule-set cache decide what to drop with the
//! functions here. They take timestamps and counters as plain values so they
//! can be tested without a clock.

use chrono::{DateTime, Duration, Utc};

/// Access bookkeeping an eviction decision needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRecord {
    pub last_access: DateTime<Utc>,
    pub hit_count: u64,
}

/// More than `window` has passed since `stamp`.
pub fn is_expired(stamp: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(stamp) > window
}

/// Entry is idle longer than `window` and has been hit fewer than `min_hits` times.
pub fn is_idle_and_cold(
    last_access: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
    hit_count: u64,
    min_hits: u64,
) -> bool {
    is_expired(last_access, now, window) && hit_count < min_hits
}

/// Inserting a new key into a full cache requires an eviction first.
pub fn needs_capacity_eviction(len: usize, max_entries: usize, is_new_key: bool) -> bool {
    is_new_key && max_entries > 0 && len >= max_entries
}

/// Key of the least-used entry: fewest hits, ties broken by oldest access.
pub fn select_least_used<'a, K, I>(entries: I) -> Option<&'a K>
where
    K: 'a,
    I: IntoIterator<Item = (&'a K, AccessRecord)>,
{
    entries
        .into_iter()
        .min_by(|(_, a), (_, b)| {
            a.hit_count
                .cmp(&b.hit_count)
                .then_with(|| a.last_access.cmp(&b.last_access))
        })
        .map(|(key, _)| key)
}
