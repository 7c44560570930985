// Shared fixtures for scoremap integration tests
#![allow(dead_code)]

use scoremap::cache::ResultCache;
use scoremap::config::ScoremapConfig;
use scoremap::core::{ScoreEntry, SubjectName, SubjectScores};
use scoremap::metrics::MetricsCollector;
use scoremap::pipeline::ScorePipeline;
use std::sync::Arc;

/// English reading and listening: 100/200 and 50/150.
pub fn english_scores() -> SubjectScores {
    SubjectScores::new()
        .with("英語R", ScoreEntry::new(100.0, 200.0))
        .with("英語L", ScoreEntry::new(50.0, 150.0))
}

/// A typical full sheet across all built-in categories.
pub fn full_sheet() -> SubjectScores {
    SubjectScores::new()
        .with("英語R", ScoreEntry::new(80.0, 160.0).with_max(100.0, 200.0))
        .with("英語L", ScoreEntry::new(70.0, 90.0).with_max(100.0, 100.0))
        .with("数学", ScoreEntry::new(150.0, 180.0).with_max(200.0, 200.0))
        .with("国語", ScoreEntry::new(160.0, 120.0).with_max(200.0, 150.0))
        .with("理科", ScoreEntry::new(140.0, 0.0).with_max(200.0, 200.0))
        .with("社会", ScoreEntry::new(75.0, 60.0).with_max(100.0, 100.0))
}

pub fn order(names: &[&str]) -> Vec<SubjectName> {
    names.iter().map(|name| SubjectName::from(*name)).collect()
}

pub fn pipeline() -> ScorePipeline {
    ScorePipeline::from_config(&ScoremapConfig::default())
}

/// Pipeline sharing the given cache and collector.
pub fn pipeline_with(cache: Arc<ResultCache>, metrics: Arc<MetricsCollector>) -> ScorePipeline {
    ScorePipeline::new(&ScoremapConfig::default(), cache, metrics)
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
