mod common;

use common::{approx_eq, english_scores, full_sheet, order, pipeline, pipeline_with};
use pretty_assertions::assert_eq;
use scoremap::cache::{CacheSettings, ResultCache};
use scoremap::chart::{ChartStatus, LabelOrientation, PatternKind};
use scoremap::core::{Category, ScoreEntry, SubjectName, SubjectScores, TestType};
use scoremap::errors::ErrorKind;
use scoremap::metrics::MetricsCollector;
use std::collections::BTreeMap;
use std::sync::Arc;

#[test]
fn test_english_reading_and_listening_chart() {
    let output = pipeline()
        .run(&english_scores(), &order(&["英語R", "英語L"]))
        .unwrap();
    let chart = output.chart();

    assert_eq!(chart.total_score, 500.0);
    assert_eq!(chart.status, ChartStatus::Success);
    assert!(!chart.has_errors);

    let detailed: Vec<(&str, f64, f64)> = chart
        .detailed_data
        .iter()
        .map(|s| (s.display_name.as_str(), s.value, s.percentage))
        .collect();
    assert_eq!(
        detailed,
        vec![
            ("英語R(共通)", 100.0, 20.0),
            ("英語R(二次)", 200.0, 40.0),
            ("英語L(共通)", 50.0, 10.0),
            ("英語L(二次)", 150.0, 30.0),
        ]
    );

    assert_eq!(chart.outer_data.len(), 1);
    assert_eq!(chart.outer_data[0].name, "英語");
    assert_eq!(chart.outer_data[0].value, 500.0);
    assert_eq!(chart.outer_data[0].percentage, 100.0);
    assert_eq!(chart.outer_data[0].label(), "英語\n(共通)");

    let reading: f64 = chart
        .detailed_data
        .iter()
        .filter(|s| s.name.as_str() == "英語R")
        .map(|s| s.percentage)
        .sum();
    assert!(approx_eq(reading, 60.0));
}

#[test]
fn test_slice_styles_follow_category_and_phase() {
    let output = pipeline()
        .run(&english_scores(), &order(&["英語R", "英語L"]))
        .unwrap();

    for slice in &output.chart().detailed_data {
        assert_eq!(slice.color, "#4E79A7");
        assert_eq!(slice.category, Category::from("英語"));
        let expected = match slice.test_type {
            TestType::Common => PatternKind::Solid,
            TestType::Second => PatternKind::Striped,
        };
        assert_eq!(slice.pattern, expected);
    }
    assert_eq!(
        output.chart().detailed_data[0].label(LabelOrientation::Inner),
        "英語R\n共通"
    );
}

#[test]
fn test_empty_input() {
    let output = pipeline().run(&SubjectScores::new(), &[]).unwrap();
    let chart = output.chart();

    assert_eq!(chart.total_score, 0.0);
    assert!(chart.detailed_data.is_empty());
    assert!(chart.outer_data.is_empty());
    assert!(!chart.has_errors);
    assert_eq!(chart.status, ChartStatus::Success);
    assert!(output.is_valid());
    assert_eq!(output.summary().total, 0.0);
}

#[test]
fn test_all_zero_subject_is_reported_not_fatal() {
    let scores = SubjectScores::new()
        .with("数学", ScoreEntry::new(0.0, 0.0))
        .with("英語R", ScoreEntry::new(10.0, 30.0));

    let output = pipeline().run(&scores, &order(&["数学", "英語R"])).unwrap();
    let chart = output.chart();

    assert!(chart.has_errors);
    assert_eq!(chart.status, ChartStatus::Partial);
    assert_eq!(chart.errors.len(), 1);
    assert_eq!(chart.errors[0].subject, Some(SubjectName::from("数学")));
    assert_eq!(chart.errors[0].kind, ErrorKind::Transform);
    assert_eq!(chart.total_score, 40.0);
    assert_eq!(chart.outer_data.len(), 1);
}

#[test]
fn test_negative_score_rejects_only_that_subject() {
    let scores = english_scores().with("数学", ScoreEntry::new(-1.0, 100.0));

    let output = pipeline()
        .run(&scores, &order(&["英語R", "英語L", "数学"]))
        .unwrap();

    assert!(!output.is_valid());
    let errors = output.validation_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "数学.commonTest");
    assert_eq!(errors[0].kind, ErrorKind::Validation);
    assert_eq!(errors[0].code, "NEGATIVE_SCORE");

    // The rejected subject is left out of the rings and flagged on the chart.
    let chart = output.chart();
    assert_eq!(chart.status, ChartStatus::Partial);
    assert!(chart.has_errors);
    assert_eq!(chart.errors.len(), 1);
    assert_eq!(chart.errors[0].subject, Some(SubjectName::from("数学")));
    assert_eq!(chart.errors[0].kind, ErrorKind::Validation);
    assert_eq!(chart.total_score, 500.0);
    assert!(chart.detailed_data.iter().all(|s| s.name.as_str() != "数学"));
    assert!(!output.metrics().contains_key(&Category::from("数学")));
}

#[test]
fn test_strict_run_returns_every_error() {
    let scores = SubjectScores::new()
        .with("英語R", ScoreEntry::new(-1.0, 10.0))
        .with("数学", ScoreEntry::new(10.0, 300.0).with_max(100.0, 200.0));

    let err = pipeline()
        .run_strict(&scores, &order(&["英語R", "数学"]))
        .unwrap_err();

    let fields: Vec<&str> = err.validation_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["数学.secondTest", "英語R.commonTest"]);
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_rings_are_consistent_on_full_sheet() {
    let scores = full_sheet();
    let output = pipeline()
        .run(&scores, &scores.default_display_order())
        .unwrap();
    let chart = output.chart();

    assert_eq!(chart.total_score, 1285.0);
    assert_eq!(chart.total_score, output.summary().total);

    let outer_names: Vec<&str> = chart.outer_data.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(outer_names, vec!["国語", "数学", "理科", "社会", "英語"]);

    let mut detailed_by_category: BTreeMap<&str, f64> = BTreeMap::new();
    for slice in &chart.detailed_data {
        *detailed_by_category.entry(slice.category.as_str()).or_default() += slice.value;
    }
    for outer in &chart.outer_data {
        assert!(approx_eq(detailed_by_category[outer.name.as_str()], outer.value));
    }

    let outer_sum: f64 = chart.outer_data.iter().map(|s| s.value).sum();
    assert!(approx_eq(outer_sum, chart.total_score));

    let percentage_sum: f64 = chart.outer_data.iter().map(|s| s.percentage).sum();
    assert!((percentage_sum - 100.0).abs() <= 0.05);

    // 理科 has no second-test score, so only one slice.
    assert_eq!(
        chart
            .detailed_data
            .iter()
            .filter(|s| s.name.as_str() == "理科")
            .count(),
        1
    );
}

#[test]
fn test_display_order_controls_output_order() {
    let scores = english_scores();
    let pipeline = pipeline();

    let forward = pipeline.run(&scores, &order(&["英語R", "英語L"])).unwrap();
    let backward = pipeline.run(&scores, &order(&["英語L", "英語R"])).unwrap();

    assert_eq!(forward.fingerprint, backward.fingerprint);
    assert!(!backward.cache_hit);
    assert_eq!(forward.chart().detailed_data[0].name.as_str(), "英語R");
    assert_eq!(backward.chart().detailed_data[0].name.as_str(), "英語L");
    assert_eq!(forward.chart().total_score, backward.chart().total_score);
}

#[test]
fn test_repeated_runs_share_one_result() {
    let cache = Arc::new(ResultCache::new(CacheSettings::default()));
    let metrics = Arc::new(MetricsCollector::new());
    let first_pipeline = pipeline_with(Arc::clone(&cache), Arc::clone(&metrics));
    let second_pipeline = pipeline_with(Arc::clone(&cache), Arc::clone(&metrics));
    let display = order(&["英語R", "英語L"]);

    let first = first_pipeline.run(&english_scores(), &display).unwrap();
    let second = second_pipeline.run(&english_scores(), &display).unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert!(Arc::ptr_eq(first.computation(), second.computation()));
    assert_eq!(first.chart(), second.chart());

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
    assert_eq!(metrics.len(), 1);
}

#[test]
fn test_metrics_for_valid_subjects() {
    let pipeline = pipeline();
    let output = pipeline
        .run(&full_sheet(), &full_sheet().default_display_order())
        .unwrap();

    let english = &output.metrics()[&Category::from("英語")];
    assert_eq!(english.total, 400.0);
    assert_eq!(english.max_total, 500.0);
    assert_eq!(english.percentage, 80.0);

    let stored = pipeline
        .metrics()
        .get_stored_metrics(&output.fingerprint)
        .unwrap();
    assert_eq!(&stored, output.metrics());
}
