//! Chart-ready datasets for the nested subject/category pie chart.

pub mod labels;
pub mod slices;
pub mod styles;
pub mod transformer;

pub use labels::{display_name, format_label, LabelOrientation};
pub use slices::{DetailedPieSlice, PieSlice};
pub use styles::{CategoryStyle, PatternKind, StyleTable};
pub use transformer::{ChartData, ChartDataTransformer, ChartError, ChartStatus, SliceOutcome};
