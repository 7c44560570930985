//! Content fingerprint of a score map.
//!
//! The key is the `subject:value:testType` triples of every entry, sorted by
//! (category, subject, test type) and joined with `|`. A maximum, when
//! present, is appended as `/max`. Values use the shortest round-trip float
//! formatting, so the key is independent of insertion order and exact.
//! `-0.0` is written as `0`.

use crate::core::{SubjectName, SubjectScores, TestType};
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh64::xxh64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(scores: &SubjectScores) -> Self {
        let mut subjects: Vec<&SubjectName> = scores.subjects().collect();
        subjects.sort_by(|a, b| a.category().cmp(&b.category()).then_with(|| a.cmp(b)));

        let parts: Vec<String> = subjects
            .into_iter()
            .filter_map(|subject| scores.get(subject.as_str()).map(|entry| (subject, entry)))
            .flat_map(|(subject, entry)| {
                TestType::ALL.into_iter().map(move |test_type| {
                    let score = unsigned_zero(entry.score(test_type));
                    let mut part = format!("{}:{}:{}", subject, score, test_type);
                    if let Some(max) = entry.max(test_type) {
                        part.push_str(&format!("/{}", unsigned_zero(max)));
                    }
                    part
                })
            })
            .collect();

        Self(parts.join("|"))
    }

    /// Key of a rendered view: the content key plus the display order.
    pub fn with_order(&self, order: &[SubjectName]) -> Fingerprint {
        let order: Vec<&str> = order.iter().map(SubjectName::as_str).collect();
        Self(format!("{}#{}", self.0, order.join(",")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 64-bit hash of the key, for logs.
    pub fn short_id(&self) -> String {
        format!("{:016x}", xxh64(self.0.as_bytes(), 0))
    }
}

/// `-0.0 + 0.0` is `0.0`; every other value is unchanged.
fn unsigned_zero(value: f64) -> f64 {
    value + 0.0
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
