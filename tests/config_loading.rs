mod common;

use common::{english_scores, order};
use indoc::indoc;
use pretty_assertions::assert_eq;
use scoremap::chart::PatternKind;
use scoremap::config::{
    default_config_toml, env, find_config_file, load_config, load_config_from_path,
    EnvironmentSnapshot, ScoremapConfig, CONFIG_FILE_NAME,
};
use scoremap::core::Category;
use scoremap::errors::ScoremapError;
use scoremap::pipeline::ScorePipeline;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a config file with content
fn create_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join(CONFIG_FILE_NAME);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_full_config_is_applied() {
    let temp = TempDir::new().unwrap();
    let path = create_config(
        temp.path(),
        indoc! {r##"
            [cache]
            max_entries = 16
            stale_after_secs = 30
            min_hits = 1
            sweep_interval_secs = 5

            [rule_cache]
            idle_window_secs = 120
            min_hits = 4

            [validation]
            max_subject_name_len = 12

            [styles."英語"]
            color = "#112233"
            pattern = "crosshatch"

            [styles."情報"]
            color = "#445566"
            pattern = "dotted"

            [default_style]
            color = "#000000"
            pattern = "solid"
        "##},
    );

    let config = load_config_from_path(&path).unwrap();

    assert_eq!(config.cache.max_entries, 16);
    assert_eq!(config.cache.stale_after_secs, 30);
    assert_eq!(config.rule_cache.min_hits, 4);
    assert_eq!(config.validation.max_subject_name_len, 12);

    let styles = config.style_table();
    assert_eq!(styles.style_for(&Category::from("英語")).color, "#112233");
    assert_eq!(styles.style_for(&Category::from("情報")).pattern, PatternKind::Dotted);
    assert_eq!(styles.style_for(&Category::from("数学")).color, "#F28E2B");
    assert_eq!(styles.style_for(&Category::from("美術")).color, "#000000");
}

#[test]
fn test_configured_styles_reach_the_chart() {
    let config = scoremap::config::parse_and_validate_config(indoc! {r##"
        [styles."英語"]
        color = "#abcdef"
        pattern = "diagonal"
    "##})
    .unwrap();

    let output = ScorePipeline::from_config(&config)
        .run(&english_scores(), &order(&["英語R", "英語L"]))
        .unwrap();

    let chart = output.chart();
    assert!(chart.detailed_data.iter().all(|s| s.color == "#abcdef"));
    assert_eq!(chart.detailed_data[1].pattern, PatternKind::Diagonal);
    assert_eq!(chart.outer_data[0].color, "#abcdef");
}

#[test]
fn test_invalid_config_reports_every_problem_with_path() {
    let temp = TempDir::new().unwrap();
    let path = create_config(
        temp.path(),
        indoc! {r##"
            [cache]
            sweep_interval_secs = 0

            [styles."英語"]
            color = "navy"
        "##},
    );

    let err = load_config_from_path(&path).unwrap_err();

    match &err {
        ScoremapError::Config { message, path: Some(p) } => {
            assert_eq!(p, &path);
            assert!(message.contains("cache.sweep_interval_secs"));
            assert!(message.contains("styles.英語.color"));
        }
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_malformed_toml_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = create_config(temp.path(), "[cache\nmax_entries = 1\n");

    assert!(matches!(
        load_config_from_path(&path),
        Err(ScoremapError::Config { .. })
    ));
}

#[test]
fn test_config_found_from_nested_directory() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("exams").join("2024");
    fs::create_dir_all(&nested).unwrap();
    let path = create_config(temp.path(), "[validation]\nmax_subject_name_len = 6\n");

    assert_eq!(find_config_file(&nested), Some(path));
}

#[test]
fn test_explicit_path_wins() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.toml");
    fs::write(&path, "[cache]\nmax_entries = 3\n").unwrap();

    let (config, source) = load_config(Some(&path)).unwrap();
    assert_eq!(config.cache.max_entries, 3);
    assert_eq!(source, Some(path));
}

#[test]
fn test_env_overrides_apply_on_top_of_file() {
    let config = scoremap::config::parse_and_validate_config("[cache]\nmax_entries = 3\n").unwrap();
    let snapshot = EnvironmentSnapshot::from_pairs([
        (env::ENV_CACHE_MAX_ENTRIES, "64"),
        (env::ENV_CACHE_STALE_SECS, "not-a-number"),
    ]);

    let config = config.with_env_overrides(&snapshot);

    assert_eq!(config.cache.max_entries, 64);
    assert_eq!(config.cache.stale_after_secs, ScoremapConfig::default().cache.stale_after_secs);
}

#[test]
fn test_default_config_file_round_trips() {
    let temp = TempDir::new().unwrap();
    let path = create_config(temp.path(), &default_config_toml().unwrap());

    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.cache, ScoremapConfig::default().cache);
    assert_eq!(config.styles.len(), 5);
}
