//! Score map to nested pie-chart datasets.
//!
//! The inner ring holds one slice per (subject, phase) with a non-zero score;
//! the outer ring holds one slice per category. Both follow the supplied
//! display order only, so output does not depend on map iteration order.
//!
//! Totals are taken over the displayed subjects, which keeps the rings
//! consistent: the detailed values of a category sum to its outer value, and
//! both rings sum to the run total.

use crate::chart::labels::display_name;
use crate::chart::slices::{DetailedPieSlice, PieSlice};
use crate::chart::styles::{PatternKind, StyleTable};
use crate::core::{Category, ScoreEntry, SubjectName, SubjectScores, TestType};
use crate::errors::{ErrorKind, Severity};
use crate::scoring::{category_total, percentage, total_score};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// A subject-level or aggregate problem found while building chart data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartError {
    /// Offending subject; absent for aggregate failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectName>,
    pub message: String,
    pub kind: ErrorKind,
    pub severity: Severity,
}

impl ChartError {
    pub fn for_subject(subject: &SubjectName, message: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.clone()),
            message: message.into(),
            kind: ErrorKind::Transform,
            severity: Severity::Error,
        }
    }

    /// A subject left out of the chart because it failed validation.
    pub fn rejected(subject: &SubjectName) -> Self {
        Self {
            subject: Some(subject.clone()),
            message: "subject failed validation and was left out".to_string(),
            kind: ErrorKind::Validation,
            severity: Severity::Error,
        }
    }

    pub fn aggregate(message: impl Into<String>) -> Self {
        Self {
            subject: None,
            message: message.into(),
            kind: ErrorKind::Transform,
            severity: Severity::Error,
        }
    }
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{}: {}", subject, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Overall outcome of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStatus {
    /// No errors.
    Success,
    /// Errors, but some slices were produced.
    Partial,
    /// Errors and no slices.
    Failure,
}

impl ChartStatus {
    fn classify(has_errors: bool, has_data: bool) -> Self {
        match (has_errors, has_data) {
            (false, _) => Self::Success,
            (true, true) => Self::Partial,
            (true, false) => Self::Failure,
        }
    }
}

/// Chart-ready output of one transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub detailed_data: Vec<DetailedPieSlice>,
    pub outer_data: Vec<PieSlice>,
    pub errors: Vec<ChartError>,
    pub has_errors: bool,
    pub status: ChartStatus,
    pub total_score: f64,
}

impl ChartData {
    pub fn empty() -> Self {
        Self {
            detailed_data: Vec::new(),
            outer_data: Vec::new(),
            errors: Vec::new(),
            has_errors: false,
            status: ChartStatus::Success,
            total_score: 0.0,
        }
    }

    fn failure(error: ChartError) -> Self {
        Self {
            errors: vec![error],
            has_errors: true,
            status: ChartStatus::Failure,
            ..Self::empty()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detailed_data.is_empty() && self.outer_data.is_empty()
    }

    /// Append errors found outside the transform and reclassify the status.
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = ChartError>) -> Self {
        self.errors.extend(errors);
        self.has_errors = !self.errors.is_empty();
        self.status = ChartStatus::classify(self.has_errors, !self.detailed_data.is_empty());
        self
    }
}

/// Result of slicing one subject.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceOutcome {
    Slices(Vec<DetailedPieSlice>),
    Error(ChartError),
}

/// Builds [`ChartData`] from validated scores.
#[derive(Debug, Clone, Copy)]
pub struct ChartDataTransformer<'a> {
    styles: &'a StyleTable,
}

impl<'a> ChartDataTransformer<'a> {
    pub fn new(styles: &'a StyleTable) -> Self {
        Self { styles }
    }

    /// Slices for one subject, percentages left at 0 until the run total is known.
    pub fn slice_subject(&self, subject: &SubjectName, entry: Option<&ScoreEntry>) -> SliceOutcome {
        let entry = match entry {
            Some(entry) => entry,
            None => {
                return SliceOutcome::Error(ChartError::for_subject(
                    subject,
                    "subject has no score entry",
                ))
            }
        };
        if entry.is_all_zero() {
            return SliceOutcome::Error(ChartError::for_subject(
                subject,
                "subject has no non-zero score",
            ));
        }

        let category = subject.category();
        let style = self.styles.style_for(&category);
        let slices = TestType::ALL
            .into_iter()
            .filter(|test_type| entry.score(*test_type) != 0.0)
            .map(|test_type| DetailedPieSlice {
                name: subject.clone(),
                value: entry.score(test_type),
                percentage: 0.0,
                color: style.color.clone(),
                category: category.clone(),
                display_name: display_name(subject.as_str(), test_type),
                test_type,
                pattern: match test_type {
                    TestType::Common => PatternKind::Solid,
                    TestType::Second => style.pattern,
                },
            })
            .collect();
        SliceOutcome::Slices(slices)
    }

    /// Build both rings for `scores` in `display_order`.
    pub fn transform(&self, scores: &SubjectScores, display_order: &[SubjectName]) -> ChartData {
        if scores.is_empty() {
            return ChartData::empty();
        }

        let mut seen = HashSet::new();
        let order: Vec<&SubjectName> = display_order
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .collect();

        let mut detailed_data = Vec::new();
        let mut errors = Vec::new();
        let mut displayed = SubjectScores::new();
        for subject in &order {
            let entry = scores.get(subject.as_str());
            match self.slice_subject(subject, entry) {
                SliceOutcome::Slices(slices) => {
                    detailed_data.extend(slices);
                    if let Some(entry) = entry {
                        displayed.insert((*subject).clone(), *entry);
                    }
                }
                SliceOutcome::Error(error) => {
                    warn!(subject = %subject, reason = %error.message, "Skipping subject");
                    errors.push(error);
                }
            }
        }

        let total = total_score(&displayed);
        if !total.is_finite() {
            return ChartData::failure(ChartError::aggregate(format!(
                "run total is not a finite number ({})",
                total
            )));
        }

        for slice in &mut detailed_data {
            slice.percentage = percentage(slice.value, total);
        }
        let outer_data = self.outer_slices(&displayed, &order, total);

        let has_errors = !errors.is_empty();
        let status = ChartStatus::classify(has_errors, !detailed_data.is_empty());
        debug!(
            detailed = detailed_data.len(),
            outer = outer_data.len(),
            errors = errors.len(),
            total,
            "Built chart data"
        );

        ChartData {
            detailed_data,
            outer_data,
            errors,
            has_errors,
            status,
            total_score: total,
        }
    }

    /// One slice per category in first-seen order; zero-valued categories are skipped.
    fn outer_slices(
        &self,
        displayed: &SubjectScores,
        order: &[&SubjectName],
        total: f64,
    ) -> Vec<PieSlice> {
        let mut seen = HashSet::new();
        order
            .iter()
            .filter(|subject| displayed.contains(subject.as_str()))
            .map(|subject| subject.category())
            .filter(|category| seen.insert(category.clone()))
            .filter_map(|category: Category| {
                let value = category_total(displayed, &category, None);
                (value != 0.0).then(|| PieSlice {
                    percentage: percentage(value, total),
                    color: self.styles.style_for(&category).color.clone(),
                    name: category.into_inner(),
                    value,
                })
            })
            .collect()
    }
}
