//! End-to-end score pipeline.
//!
//! A [`ScorePipeline`] owns everything one run needs (validator, style table,
//! shared result cache and metrics collector) and wires the stages together:
//!
//! 1. fingerprint the input; on a cache hit return the stored result
//! 2. validate every subject, dropping the ones that fail
//! 3. summarize, transform to chart data (rejected subjects in the display
//!    order become chart errors), collect metrics
//! 4. store the result under the fingerprint
//!
//! The cache and collector are injected as `Arc`s so several pipelines (or a
//! test and a pipeline) can share or isolate them.

use crate::cache::{
    BackgroundSweeper, CachedComputation, ComputedScores, Fingerprint, ResultCache, Sweep,
};
use crate::chart::{ChartData, ChartDataTransformer, ChartError, StyleTable};
use crate::config::ScoremapConfig;
use crate::core::{SubjectName, SubjectScores};
use crate::errors::{Result, ScoremapError};
use crate::metrics::{CategoryMetrics, MetricsCollector};
use crate::scoring::{summarize, ScoreSummary};
use crate::validation::score_rules::{category_total_rules, CategoryTotal, GRAND_TOTAL};
use crate::validation::{
    Dependencies, RuleSetCache, SubjectScoresValidator, ValidationContext, ValidationError,
    Validator,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Content key of the input scores; metrics are stored under it.
    pub fingerprint: Fingerprint,
    /// Whether the result came from the cache.
    pub cache_hit: bool,
    computation: Arc<CachedComputation>,
}

impl PipelineOutput {
    pub fn chart(&self) -> &ChartData {
        &self.computation.scores.chart
    }

    pub fn summary(&self) -> &ScoreSummary {
        &self.computation.scores.summary
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.computation.scores.validation_errors
    }

    pub fn metrics(&self) -> &CategoryMetrics {
        &self.computation.metrics
    }

    /// The shared computation backing this output.
    pub fn computation(&self) -> &Arc<CachedComputation> {
        &self.computation
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}

pub struct ScorePipeline {
    styles: StyleTable,
    validator: SubjectScoresValidator,
    category_totals: Validator<CategoryTotal>,
    cache: Arc<ResultCache>,
    metrics: Arc<MetricsCollector>,
}

impl ScorePipeline {
    /// Pipeline with its own rule-set cache configured from `config`.
    pub fn new(
        config: &ScoremapConfig,
        cache: Arc<ResultCache>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let rule_cache = Arc::new(RuleSetCache::new(config.rule_cache));
        Self::with_rule_cache(config, cache, metrics, rule_cache)
    }

    pub fn with_rule_cache(
        config: &ScoremapConfig,
        cache: Arc<ResultCache>,
        metrics: Arc<MetricsCollector>,
        rule_cache: Arc<RuleSetCache>,
    ) -> Self {
        let category_totals = rule_cache.get_or_build("category_total", category_total_rules);
        let ctx = ValidationContext::new(config.validation.max_subject_name_len, rule_cache);
        Self {
            styles: config.style_table(),
            validator: SubjectScoresValidator::new(&ctx),
            category_totals,
            cache,
            metrics,
        }
    }

    /// Pipeline with fresh cache and collector sized from `config`.
    pub fn from_config(config: &ScoremapConfig) -> Self {
        Self::new(
            config,
            Arc::new(ResultCache::new(config.cache)),
            Arc::new(MetricsCollector::with_settings(config.cache)),
        )
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Sweep the result cache and the metrics store on the cache's interval.
    pub fn start_sweeper(&self) -> BackgroundSweeper {
        let interval = Duration::from_secs(self.cache.settings().sweep_interval_secs.max(1));
        let cache: Arc<dyn Sweep> = self.cache.clone();
        let metrics: Arc<dyn Sweep> = self.metrics.clone();
        BackgroundSweeper::start_all(vec![cache, metrics], interval)
    }

    /// Run the pipeline. Validation failures are reported in the output.
    pub fn run(
        &self,
        scores: &SubjectScores,
        display_order: &[SubjectName],
    ) -> Result<PipelineOutput> {
        let fingerprint = Fingerprint::of(scores);
        let view_key = fingerprint.with_order(display_order);

        if let Some(computation) = self.cache.get(&view_key) {
            info!(key = %view_key.short_id(), "Reusing cached result");
            return Ok(PipelineOutput {
                fingerprint,
                cache_hit: true,
                computation,
            });
        }

        info!(
            subjects = scores.len(),
            displayed = display_order.len(),
            key = %view_key.short_id(),
            "Running score pipeline"
        );

        let partition = self.validator.partition(scores)?;
        let rejected: HashSet<&str> = partition
            .rejected
            .iter()
            .map(SubjectName::as_str)
            .collect();
        let order: Vec<SubjectName> = display_order
            .iter()
            .filter(|name| !rejected.contains(name.as_str()))
            .cloned()
            .collect();

        let summary = summarize(&partition.valid);
        debug!(
            total = summary.total,
            categories = summary.by_category.len(),
            "Summarized scores"
        );

        let mut seen = HashSet::new();
        let dropped: Vec<ChartError> = display_order
            .iter()
            .filter(|name| rejected.contains(name.as_str()) && seen.insert(name.as_str()))
            .map(ChartError::rejected)
            .collect();
        let chart = ChartDataTransformer::new(&self.styles)
            .transform(&partition.valid, &order)
            .with_errors(dropped);
        self.check_category_totals(&chart)?;

        let metrics = self
            .metrics
            .collect_metrics_for(fingerprint.clone(), &partition.valid);

        let computation = self.cache.set(
            view_key,
            ComputedScores {
                summary,
                chart,
                validation_errors: partition.errors,
            },
            metrics,
        );
        info!(
            valid = partition.valid.len(),
            rejected = partition.rejected.len(),
            status = ?computation.scores.chart.status,
            "Score pipeline finished"
        );

        Ok(PipelineOutput {
            fingerprint,
            cache_hit: false,
            computation,
        })
    }

    /// Every outer slice must fit inside the total of the chart it belongs to.
    fn check_category_totals(&self, chart: &ChartData) -> Result<()> {
        let dependencies = Dependencies::new().with(GRAND_TOTAL, chart.total_score);
        for slice in &chart.outer_data {
            let share = CategoryTotal {
                category: slice.name.as_str().into(),
                total: slice.value,
            };
            let (errors, _) = self.category_totals.evaluate(&share, Some(&dependencies))?;
            if let Some(error) = errors.first() {
                return Err(ScoremapError::Calculation(format!(
                    "category {} ({}): {}",
                    slice.name, slice.value, error.message
                )));
            }
        }
        Ok(())
    }

    /// Run the pipeline, failing with every validation error if any subject is invalid.
    pub fn run_strict(
        &self,
        scores: &SubjectScores,
        display_order: &[SubjectName],
    ) -> Result<PipelineOutput> {
        let output = self.run(scores, display_order)?;
        if output.is_valid() {
            Ok(output)
        } else {
            Err(ScoremapError::validation(output.validation_errors().to_vec()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheSettings;
    use crate::chart::ChartStatus;
    use crate::core::{Category, ScoreEntry};
    use crate::errors::ErrorKind;
    use std::time::Instant;
    use pretty_assertions::assert_eq;

    fn pipeline() -> ScorePipeline {
        ScorePipeline::from_config(&ScoremapConfig::default())
    }

    fn order(names: &[&str]) -> Vec<SubjectName> {
        names.iter().map(|n| SubjectName::from(*n)).collect()
    }

    #[test]
    fn test_run_reports_invalid_subject_and_keeps_the_rest() {
        let scores = SubjectScores::new()
            .with("英語R", ScoreEntry::new(100.0, 200.0))
            .with("英語L", ScoreEntry::new(-1.0, 150.0));

        let output = pipeline().run(&scores, &order(&["英語R", "英語L"])).unwrap();

        assert_eq!(output.validation_errors().len(), 1);
        assert_eq!(output.validation_errors()[0].field, "英語L.commonTest");
        assert_eq!(output.chart().total_score, 300.0);
        assert_eq!(output.summary().total, 300.0);

        let chart = output.chart();
        assert_eq!(chart.status, ChartStatus::Partial);
        assert!(chart.has_errors);
        assert_eq!(chart.errors.len(), 1);
        assert_eq!(chart.errors[0].subject, Some(SubjectName::from("英語L")));
        assert_eq!(chart.errors[0].kind, ErrorKind::Validation);

        let json = serde_json::to_value(chart).unwrap();
        assert_eq!(json["status"], serde_json::json!("partial"));
        assert_eq!(json["hasErrors"], serde_json::json!(true));
    }

    #[test]
    fn test_rejected_subject_outside_display_order_is_not_charted_as_error() {
        let scores = SubjectScores::new()
            .with("英語R", ScoreEntry::new(100.0, 200.0))
            .with("数学", ScoreEntry::new(-1.0, 10.0));

        let output = pipeline().run(&scores, &order(&["英語R"])).unwrap();

        assert_eq!(output.validation_errors().len(), 1);
        assert_eq!(output.chart().status, ChartStatus::Success);
    }

    #[test]
    fn test_large_totals_pass_category_check() {
        let scores = SubjectScores::new()
            .with("X", ScoreEntry::new(1e16, 0.0))
            .with("XR", ScoreEntry::new(1.0, 0.0))
            .with("XL", ScoreEntry::new(1.0, 0.0))
            .with("Y", ScoreEntry::new(0.1, 0.2));
        let display = order(&["X", "XR", "Y", "XL"]);

        for _ in 0..20 {
            let output = pipeline().run(&scores, &display).unwrap();
            assert_eq!(output.chart().status, ChartStatus::Success);
        }
    }

    #[test]
    fn test_metrics_stored_under_input_fingerprint_with_invalid_subject() {
        let pipeline = pipeline();
        let scores = SubjectScores::new()
            .with("英語R", ScoreEntry::new(50.0, 50.0).with_max(100.0, 100.0))
            .with("英語L", ScoreEntry::new(-1.0, 10.0));

        let output = pipeline.run(&scores, &order(&["英語R", "英語L"])).unwrap();

        assert!(!output.is_valid());
        let stored = pipeline.metrics().get_stored_metrics(&output.fingerprint);
        assert_eq!(stored.as_ref(), Some(output.metrics()));
        assert_eq!(output.metrics()[&Category::from("英語")].total, 100.0);
    }

    #[test]
    fn test_sweeper_covers_cache_and_metrics() {
        let config = ScoremapConfig {
            cache: CacheSettings {
                stale_after_secs: 0,
                min_hits: 1,
                sweep_interval_secs: 1,
                ..CacheSettings::default()
            },
            ..ScoremapConfig::default()
        };
        let pipeline = ScorePipeline::from_config(&config);
        let scores = SubjectScores::new().with("数学", ScoreEntry::new(80.0, 120.0));
        pipeline.run(&scores, &order(&["数学"])).unwrap();
        assert_eq!(pipeline.metrics().len(), 1);

        let mut sweeper = pipeline.start_sweeper();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !(pipeline.cache().is_empty() && pipeline.metrics().is_empty())
            && Instant::now() < deadline
        {
            std::thread::sleep(Duration::from_millis(20));
        }
        sweeper.stop();

        assert!(pipeline.cache().is_empty());
        assert!(pipeline.metrics().is_empty());
        assert!(sweeper.sweeps() >= 1);
    }

    #[test]
    fn test_second_run_hits_cache() {
        let pipeline = pipeline();
        let scores = SubjectScores::new().with("数学", ScoreEntry::new(80.0, 120.0));
        let order = order(&["数学"]);

        let first = pipeline.run(&scores, &order).unwrap();
        let second = pipeline.run(&scores, &order).unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert!(Arc::ptr_eq(first.computation(), second.computation()));
        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[test]
    fn test_run_strict_fails_with_all_errors() {
        let scores = SubjectScores::new()
            .with("英語R", ScoreEntry::new(-1.0, -1.0))
            .with("数学", ScoreEntry::new(10.0, 10.0));

        let err = pipeline()
            .run_strict(&scores, &order(&["英語R", "数学"]))
            .unwrap_err();

        assert_eq!(err.validation_errors().len(), 2);
    }

    #[test]
    fn test_metrics_are_collected() {
        let pipeline = pipeline();
        let scores = SubjectScores::new()
            .with("英語R", ScoreEntry::new(50.0, 50.0).with_max(100.0, 100.0));

        let output = pipeline.run(&scores, &order(&["英語R"])).unwrap();

        assert_eq!(output.metrics().len(), 1);
        assert_eq!(
            pipeline.metrics().get_stored_metrics(&output.fingerprint).as_ref(),
            Some(output.metrics())
        );
    }
}
