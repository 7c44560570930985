//! Chart slice records.

use crate::chart::labels::{format_label, LabelOrientation};
use crate::chart::styles::PatternKind;
use crate::core::{Category, SubjectName, TestType};
use serde::{Deserialize, Serialize};

/// One category slice of the outer ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    /// Share of the run total, 0-100 with two decimals
    pub percentage: f64,
    pub color: String,
}

/// One subject/phase slice of the inner ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedPieSlice {
    /// Subject the slice belongs to
    pub name: SubjectName,
    pub value: f64,
    pub percentage: f64,
    pub color: String,
    pub category: Category,
    /// `"<subject>(<test-type>)"`
    pub display_name: String,
    pub test_type: TestType,
    pub pattern: PatternKind,
}

impl PieSlice {
    pub fn label(&self) -> String {
        format_label(&self.name, None, LabelOrientation::Outer)
    }
}

impl DetailedPieSlice {
    pub fn label(&self, orientation: LabelOrientation) -> String {
        format_label(self.name.as_str(), Some(self.test_type), orientation)
    }
}
