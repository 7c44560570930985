//! Slice label text.

use crate::core::TestType;
use serde::{Deserialize, Serialize};

/// Which ring of the nested chart a label is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelOrientation {
    Inner,
    Outer,
}

/// Label for a slice. Category labels (no test type) are returned unchanged.
pub fn format_label(
    name: &str,
    test_type: Option<TestType>,
    orientation: LabelOrientation,
) -> String {
    match (test_type, orientation) {
        (None, _) => name.to_string(),
        (Some(test_type), LabelOrientation::Inner) => format!("{}\n{}", name, test_type.label()),
        (Some(test_type), LabelOrientation::Outer) => {
            format!("{}\n({})", name, test_type.label())
        }
    }
}

/// `"<subject>(<test-type>)"`, as carried on detailed slices.
pub fn display_name(subject: &str, test_type: TestType) -> String {
    format!("{}({})", subject, test_type.label())
}
