use super::{load_settings, read_scores};
use crate::core::SubjectScores;
use crate::validation::{
    validate_subject_scores, RuleSetCache, ValidationContext, ValidationError, ValidationResult,
};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

pub fn handle_validate_command(scores: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(config.as_deref())?;
    let subject_scores = read_scores(&scores)?;

    let ctx = ValidationContext::new(
        settings.validation.max_subject_name_len,
        Arc::new(RuleSetCache::new(settings.rule_cache)),
    );
    let result = validate_subject_scores(&subject_scores, &ctx).context("Validation failed")?;

    println!("{}", format_report(&result));
    if !result.is_valid() {
        bail!("{} validation error(s) in {}", result.errors().len(), scores.display());
    }
    Ok(())
}

pub fn format_report(result: &ValidationResult<SubjectScores>) -> String {
    if result.is_valid() {
        let subjects = result.data().map_or(0, SubjectScores::len);
        return format!("✓ {} subject(s) valid", subjects);
    }

    result
        .errors()
        .iter()
        .map(format_error)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_error(error: &ValidationError) -> String {
    format!(
        "✗ [{}] {} {}: {}",
        error.severity, error.code, error.field, error.message
    )
}
