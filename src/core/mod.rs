//! Score record model.
//!
//! The types here are the validated data shape every other module consumes:
//! a subject name, the two test phases, the per-subject score entry and the
//! mapping from subject to entry. Construction is unchecked so that the
//! validation engine can report every problem at once; see
//! [`crate::validation::score_rules`] for the invariants.

pub mod category;
pub mod refined;

pub use category::{extract_category, Category};
pub use refined::{NonNegative, UnitInterval, WeightFactor};

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier of one scored exam component (e.g. `英語R`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectName(String);

impl SubjectName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Category this subject collapses into once its variant suffix is stripped.
    pub fn category(&self) -> Category {
        extract_category(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SubjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SubjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for SubjectName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SubjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Exam phase a score belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// First-stage common test
    Common,
    /// Second-stage individual test
    Second,
}

impl TestType {
    /// Both phases in display order.
    pub const ALL: [TestType; 2] = [TestType::Common, TestType::Second];

    /// Text shown in chart labels and display names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Common => "共通",
            Self::Second => "二次",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Second => "second",
        }
    }

    /// Field name used in validation error paths.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Common => "commonTest",
            Self::Second => "secondTest",
        }
    }

    /// Field name of the matching maximum.
    pub fn max_field_name(&self) -> &'static str {
        match self {
            Self::Common => "maxCommonTest",
            Self::Second => "maxSecondTest",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores of one subject, optionally with the attainable maximum per phase.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub common_test: f64,
    pub second_test: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_common_test: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_second_test: Option<f64>,
}

impl ScoreEntry {
    pub fn new(common_test: f64, second_test: f64) -> Self {
        Self {
            common_test,
            second_test,
            max_common_test: None,
            max_second_test: None,
        }
    }

    pub fn with_max(mut self, max_common_test: f64, max_second_test: f64) -> Self {
        self.max_common_test = Some(max_common_test);
        self.max_second_test = Some(max_second_test);
        self
    }

    pub fn score(&self, test_type: TestType) -> f64 {
        match test_type {
            TestType::Common => self.common_test,
            TestType::Second => self.second_test,
        }
    }

    pub fn max(&self, test_type: TestType) -> Option<f64> {
        match test_type {
            TestType::Common => self.max_common_test,
            TestType::Second => self.max_second_test,
        }
    }

    /// Sum of both phases.
    pub fn total(&self) -> f64 {
        self.common_test + self.second_test
    }

    /// Sum of the maxima that are present.
    pub fn max_total(&self) -> f64 {
        self.max_common_test.unwrap_or(0.0) + self.max_second_test.unwrap_or(0.0)
    }

    pub fn is_all_zero(&self) -> bool {
        self.common_test == 0.0 && self.second_test == 0.0
    }
}

/// Mapping from subject to its scores.
///
/// Iteration is by subject name, so every fold over a map adds its floats in
/// the same order. Anything user-visible is ordered by an explicit display
/// order or by [`SubjectScores::default_display_order`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectScores(BTreeMap<SubjectName, ScoreEntry>);

impl SubjectScores {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert or replace a subject, returning the previous entry.
    pub fn insert(
        &mut self,
        subject: impl Into<SubjectName>,
        entry: ScoreEntry,
    ) -> Option<ScoreEntry> {
        self.0.insert(subject.into(), entry)
    }

    pub fn with(mut self, subject: impl Into<SubjectName>, entry: ScoreEntry) -> Self {
        self.insert(subject, entry);
        self
    }

    pub fn get(&self, subject: &str) -> Option<&ScoreEntry> {
        self.0.get(subject)
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.0.contains_key(subject)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SubjectName, &ScoreEntry)> {
        self.0.iter()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &SubjectName> {
        self.0.keys()
    }

    /// Copy of the subset named in `order`, ignoring names that are absent.
    pub fn restricted_to(&self, order: &[SubjectName]) -> SubjectScores {
        order
            .iter()
            .filter_map(|name| self.0.get_key_value(name.as_str()))
            .map(|(name, entry)| (name.clone(), *entry))
            .collect()
    }

    /// Subjects sorted by (category, name); used when no display order is supplied.
    pub fn default_display_order(&self) -> Vec<SubjectName> {
        let mut names: Vec<SubjectName> = self.0.keys().cloned().collect();
        names.sort_by(|a, b| a.category().cmp(&b.category()).then_with(|| a.cmp(b)));
        names
    }
}

impl FromIterator<(SubjectName, ScoreEntry)> for SubjectScores {
    fn from_iter<I: IntoIterator<Item = (SubjectName, ScoreEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SubjectScores {
    type Item = (&'a SubjectName, &'a ScoreEntry);
    type IntoIter = std::collections::btree_map::Iter<'a, SubjectName, ScoreEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Admin-editable score with an optional weighting dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedScoreRecord {
    pub subject: SubjectName,
    pub test_type: TestType,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl WeightedScoreRecord {
    pub fn new(subject: impl Into<SubjectName>, test_type: TestType, score: f64) -> Self {
        Self {
            subject: subject.into(),
            test_type,
            score,
            max_score: None,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_max_score(mut self, max_score: f64) -> Self {
        self.max_score = Some(max_score);
        self
    }
}
