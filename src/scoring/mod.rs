//! Score aggregation.

pub mod calculator;

pub use calculator::{
    category_total, category_totals, percentage, round2, summarize, test_type_total, total_score,
    weighted_score, ScoreSummary,
};
