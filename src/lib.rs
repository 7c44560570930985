// Export modules for library usage
pub mod cache;
pub mod chart;
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod metrics;
pub mod pipeline;
pub mod scoring;
pub mod validation;

// Re-export commonly used types
pub use crate::core::{
    extract_category, Category, ScoreEntry, SubjectName, SubjectScores, TestType,
    WeightedScoreRecord,
};

pub use crate::errors::{ErrorCode, ErrorKind, Result, ScoremapError, Severity};

pub use crate::validation::{
    validate_subject_scores, RuleSet, ValidationContext, ValidationError, ValidationResult,
    Validator,
};

pub use crate::scoring::{percentage, summarize, total_score, ScoreSummary};

pub use crate::chart::{
    ChartData, ChartDataTransformer, ChartError, ChartStatus, DetailedPieSlice, PieSlice,
    StyleTable,
};

pub use crate::cache::{BackgroundSweeper, Fingerprint, ResultCache};

pub use crate::metrics::MetricsCollector;

pub use crate::config::{load_config, ScoremapConfig};

pub use crate::pipeline::{PipelineOutput, ScorePipeline};
