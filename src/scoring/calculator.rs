//! Pure aggregation over subject scores.
//!
//! Nothing here validates or clamps: negative scores are rejected by the
//! validation rules before a map reaches the calculator.

use crate::core::{Category, SubjectScores, TestType, WeightFactor};
use serde::Serialize;
use std::collections::BTreeMap;

/// Sum of both phases over every subject. Empty map gives 0.
pub fn total_score(subjects: &SubjectScores) -> f64 {
    subjects.iter().map(|(_, entry)| entry.total()).sum()
}

/// Sum over the subjects of `category`, optionally restricted to one phase.
///
/// An unknown category gives 0.
pub fn category_total(
    subjects: &SubjectScores,
    category: &Category,
    test_type: Option<TestType>,
) -> f64 {
    subjects
        .iter()
        .filter(|(name, _)| name.category() == *category)
        .map(|(_, entry)| match test_type {
            Some(test_type) => entry.score(test_type),
            None => entry.total(),
        })
        .sum()
}

/// Sum of one phase over every subject.
pub fn test_type_total(subjects: &SubjectScores, test_type: TestType) -> f64 {
    subjects
        .iter()
        .map(|(_, entry)| entry.score(test_type))
        .sum()
}

/// Total per category, ordered by category.
pub fn category_totals(subjects: &SubjectScores) -> BTreeMap<Category, f64> {
    subjects
        .iter()
        .fold(BTreeMap::new(), |mut totals, (name, entry)| {
            *totals.entry(name.category()).or_insert(0.0) += entry.total();
            totals
        })
}

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Share of `value` in `total` on a 0-100 scale, rounded to two decimals.
///
/// A zero total gives 0 rather than NaN.
pub fn percentage(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    round2(value / total * 100.0)
}

pub fn weighted_score(value: f64, weight: WeightFactor) -> f64 {
    value * weight.get()
}

/// Aggregates of one score map.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub total: f64,
    pub by_category: BTreeMap<Category, f64>,
    pub by_test_type: BTreeMap<TestType, f64>,
}

impl ScoreSummary {
    pub fn category_percentage(&self, category: &Category) -> f64 {
        self.by_category
            .get(category)
            .map_or(0.0, |value| percentage(*value, self.total))
    }
}

pub fn summarize(subjects: &SubjectScores) -> ScoreSummary {
    ScoreSummary {
        total: total_score(subjects),
        by_category: category_totals(subjects),
        by_test_type: TestType::ALL
            .into_iter()
            .map(|test_type| (test_type, test_type_total(subjects, test_type)))
            .collect(),
    }
}
