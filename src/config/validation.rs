//! Configuration validation with error accumulation.
//!
//! Every check runs and every problem is reported, so a user sees all
//! configuration issues in a single run.

use crate::errors::{Result, ScoremapError, Severity};
use crate::validation::{RuleCategory, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use stillwater::{NonEmptyVec, Validation};

use super::ScoremapConfig;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9A-Fa-f]{3}|[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$")
        .expect("hex color pattern is valid")
});

pub type ConfigValidation = Validation<(), NonEmptyVec<ValidationError>>;

fn issue(
    field: impl Into<String>,
    message: impl Into<String>,
    category: RuleCategory,
) -> ValidationError {
    ValidationError::new(field, message, "CONFIG_INVALID", Severity::Error, category)
}

fn check_color(field: String, color: &str) -> Option<ValidationError> {
    (!HEX_COLOR.is_match(color)).then(|| {
        issue(
            field,
            format!("`{}` is not a hex color (#rgb, #rrggbb or #rrggbbaa)", color),
            RuleCategory::Format,
        )
    })
}

/// Collect every problem in `config`.
pub fn config_issues(config: &ScoremapConfig) -> Vec<ValidationError> {
    let mut issues = Vec::new();

    if config.cache.sweep_interval_secs == 0 {
        issues.push(issue(
            "cache.sweep_interval_secs",
            "must be at least 1 second",
            RuleCategory::Range,
        ));
    }
    if config.rule_cache.idle_window_secs == 0 {
        issues.push(issue(
            "rule_cache.idle_window_secs",
            "must be at least 1 second",
            RuleCategory::Range,
        ));
    }
    if config.validation.max_subject_name_len == 0 {
        issues.push(issue(
            "validation.max_subject_name_len",
            "must be greater than zero",
            RuleCategory::Range,
        ));
    }

    issues.extend(
        config
            .styles
            .iter()
            .filter_map(|(category, style)| {
                check_color(format!("styles.{}.color", category), &style.color)
            }),
    );
    if let Some(style) = &config.default_style {
        issues.extend(check_color("default_style.color".to_string(), &style.color));
    }
    if config.styles.keys().any(|category| category.as_str().trim().is_empty()) {
        issues.push(issue("styles", "category name must not be empty", RuleCategory::Required));
    }

    issues
}

/// Validate entire config, accumulating ALL errors.
pub fn validate_config(config: &ScoremapConfig) -> ConfigValidation {
    let mut issues = config_issues(config).into_iter();
    match issues.next() {
        None => Validation::Success(()),
        Some(head) => Validation::Failure(NonEmptyVec::new(head, issues.collect())),
    }
}

/// `Result` form: every issue folded into one configuration error.
pub fn validate_config_result(config: &ScoremapConfig, path: Option<&Path>) -> Result<()> {
    match validate_config(config) {
        Validation::Success(()) => Ok(()),
        Validation::Failure(errors) => {
            let message = errors
                .into_iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            Err(ScoremapError::config(message, path.map(Path::to_path_buf)))
        }
    }
}
