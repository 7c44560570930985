//! Built-in rule sets for score data.
//!
//! - [`subject_name_rules`]: format of a subject identifier
//! - [`score_entry_rules`]: finite, non-negative, within max when max is present
//! - [`weighted_record_rules`]: admin edits with an optional weight
//! - [`category_total_rules`]: a category total never exceeds the grand total
//!
//! [`SubjectScoresValidator`] applies the name and entry rules to every
//! subject of a [`SubjectScores`] map, prefixing error fields with the
//! subject name (`英語R.commonTest`).

use crate::core::{
    Category, NonNegative, ScoreEntry, SubjectName, SubjectScores, TestType, UnitInterval,
    WeightedScoreRecord,
};
use crate::errors::Result;
use crate::validation::result::{ValidationError, ValidationMetadata, ValidationResult};
use crate::validation::rule_cache::RuleSetCache;
use crate::validation::rules::{Dependencies, DependencyRule, RuleCategory, RuleSet, ValidationRule};
use crate::validation::validator::Validator;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use stillwater::predicate::le;
use stillwater::refined::Predicate as RefinedPredicate;
use tracing::{debug, warn};

/// Default upper bound on subject name length, in characters.
pub const DEFAULT_MAX_SUBJECT_NAME_LEN: usize = 32;

/// Key of the grand total in [`Dependencies`].
pub const GRAND_TOTAL: &str = "grand_total";

/// Absolute slack for float accumulation when comparing totals.
const TOTAL_EPSILON: f64 = 1e-9;

/// Slack per unit of magnitude; covers the rounding of sums over thousands of terms.
const RELATIVE_EPSILON: f64 = 1e-12;

/// `part` fits inside `whole` up to summation rounding.
fn fits_within(part: f64, whole: f64) -> bool {
    part <= whole + TOTAL_EPSILON.max(whole.abs() * RELATIVE_EPSILON)
}

static SHARED_RULE_CACHE: Lazy<Arc<RuleSetCache>> =
    Lazy::new(|| Arc::new(RuleSetCache::default()));

/// Process-wide rule-set cache used when no other is supplied.
pub fn shared_rule_cache() -> Arc<RuleSetCache> {
    Arc::clone(&SHARED_RULE_CACHE)
}

pub fn subject_name_rules(max_len: usize) -> RuleSet<SubjectName> {
    RuleSet::new()
        .with_rule(
            ValidationRule::new(
                "",
                "EMPTY_SUBJECT_NAME",
                "subject name must not be empty",
                |n: &SubjectName| !n.as_str().trim().is_empty(),
            )
            .with_category(RuleCategory::Required),
        )
        .with_rule(ValidationRule::new(
            "",
            "SUBJECT_NAME_WHITESPACE",
            "subject name must not have leading or trailing whitespace",
            |n: &SubjectName| n.as_str() == n.as_str().trim(),
        ))
        .with_rule(ValidationRule::new(
            "",
            "SUBJECT_NAME_CONTROL_CHARS",
            "subject name must not contain control characters",
            |n: &SubjectName| !n.as_str().chars().any(char::is_control),
        ))
        .with_rule(
            ValidationRule::from_predicate(
                "",
                "SUBJECT_NAME_TOO_LONG",
                format!("subject name must be at most {} characters", max_len),
                |n: &SubjectName| n.as_str().chars().count(),
                le(max_len),
            )
            .with_category(RuleCategory::Range),
        )
}

/// `value` is known to be above `bound`. NaN on either side is left to the
/// finiteness rules.
fn is_above(value: f64, bound: f64) -> bool {
    value.partial_cmp(&bound) == Some(Ordering::Greater)
}

/// Rules for one test phase of a [`ScoreEntry`].
fn phase_rules(rules: RuleSet<ScoreEntry>, test_type: TestType) -> RuleSet<ScoreEntry> {
    let field = test_type.field_name();
    let max_field = test_type.max_field_name();

    rules
        .with_rule(
            ValidationRule::new(
                field,
                "NON_FINITE_SCORE",
                "score must be a finite number",
                move |e: &ScoreEntry| e.score(test_type).is_finite(),
            )
            .with_category(RuleCategory::Format),
        )
        .with_rule(
            ValidationRule::new(
                field,
                "NEGATIVE_SCORE",
                "score must be non-negative",
                move |e: &ScoreEntry| !is_above(0.0, e.score(test_type)),
            )
            .with_category(RuleCategory::Range),
        )
        .with_conditional_rules(
            move |e: &ScoreEntry| e.max(test_type).is_some(),
            vec![
                ValidationRule::new(
                    max_field,
                    "INVALID_MAX",
                    "maximum must be a finite non-negative number",
                    move |e: &ScoreEntry| {
                        e.max(test_type)
                            .map_or(true, |max| NonNegative::check(&max).is_ok())
                    },
                )
                .with_category(RuleCategory::Range),
                ValidationRule::new(
                    field,
                    "SCORE_EXCEEDS_MAX",
                    "score must not exceed its maximum",
                    move |e: &ScoreEntry| {
                        e.max(test_type)
                            .map_or(true, |max| !is_above(e.score(test_type), max))
                    },
                )
                .with_category(RuleCategory::Range),
            ],
        )
}

pub fn score_entry_rules() -> RuleSet<ScoreEntry> {
    TestType::ALL.into_iter().fold(RuleSet::new(), phase_rules)
}

pub fn weighted_record_rules() -> RuleSet<WeightedScoreRecord> {
    RuleSet::new()
        .with_rule(
            ValidationRule::new(
                "subject",
                "EMPTY_SUBJECT_NAME",
                "subject name must not be empty",
                |r: &WeightedScoreRecord| !r.subject.as_str().trim().is_empty(),
            )
            .with_category(RuleCategory::Required),
        )
        .with_rule(
            ValidationRule::new(
                "score",
                "INVALID_SCORE",
                "score must be a finite non-negative number",
                |r: &WeightedScoreRecord| NonNegative::check(&r.score).is_ok(),
            )
            .with_category(RuleCategory::Range),
        )
        .with_conditional_rules(
            |r: &WeightedScoreRecord| r.weight.is_some(),
            vec![ValidationRule::new(
                "weight",
                "WEIGHT_OUT_OF_RANGE",
                "weight must be within [0, 1]",
                |r: &WeightedScoreRecord| {
                    r.weight
                        .map_or(true, |w| UnitInterval::check(&w).is_ok())
                },
            )
            .with_category(RuleCategory::Range)],
        )
        .with_conditional_rules(
            |r: &WeightedScoreRecord| r.max_score.is_some(),
            vec![
                ValidationRule::new(
                    "maxScore",
                    "INVALID_MAX",
                    "maximum must be a finite non-negative number",
                    |r: &WeightedScoreRecord| {
                        r.max_score
                            .map_or(true, |max| NonNegative::check(&max).is_ok())
                    },
                )
                .with_category(RuleCategory::Range),
                ValidationRule::new(
                    "score",
                    "SCORE_EXCEEDS_MAX",
                    "score must not exceed its maximum",
                    |r: &WeightedScoreRecord| {
                        r.max_score.map_or(true, |max| !is_above(r.score, max))
                    },
                )
                .with_category(RuleCategory::Range),
            ],
        )
}

/// A category's aggregated total, checked against its siblings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
}

pub fn category_total_rules() -> RuleSet<CategoryTotal> {
    RuleSet::new()
        .with_rule(
            ValidationRule::new(
                "total",
                "INVALID_TOTAL",
                "category total must be a finite non-negative number",
                |c: &CategoryTotal| NonNegative::check(&c.total).is_ok(),
            )
            .with_category(RuleCategory::Calculation),
        )
        .with_dependency_rule(DependencyRule::new(
            "total",
            "CATEGORY_EXCEEDS_TOTAL",
            "category total must not exceed the grand total",
            &[GRAND_TOTAL],
            |c: &CategoryTotal, deps: &Dependencies| {
                deps.get(GRAND_TOTAL)
                    .map_or(false, |grand| fits_within(c.total, grand))
            },
        ))
}

/// Settings and shared state for validating score maps.
#[derive(Clone)]
pub struct ValidationContext {
    pub max_subject_name_len: usize,
    pub rule_cache: Arc<RuleSetCache>,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            max_subject_name_len: DEFAULT_MAX_SUBJECT_NAME_LEN,
            rule_cache: shared_rule_cache(),
        }
    }
}

impl ValidationContext {
    pub fn new(max_subject_name_len: usize, rule_cache: Arc<RuleSetCache>) -> Self {
        Self {
            max_subject_name_len,
            rule_cache,
        }
    }
}

/// Split of a score map into what passed and what did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoresPartition {
    /// Subjects whose name and entry passed every rule.
    pub valid: SubjectScores,
    /// Every failure across all subjects, fields prefixed with the subject.
    pub errors: Vec<ValidationError>,
    /// Subjects dropped because at least one rule failed, sorted.
    pub rejected: Vec<SubjectName>,
    pub metadata: ValidationMetadata,
}

/// Applies the name and entry rule sets to every subject of a map.
#[derive(Debug, Clone)]
pub struct SubjectScoresValidator {
    names: Validator<SubjectName>,
    entries: Validator<ScoreEntry>,
}

impl SubjectScoresValidator {
    pub fn new(ctx: &ValidationContext) -> Self {
        let max_len = ctx.max_subject_name_len;
        let names = ctx
            .rule_cache
            .get_or_build(&format!("subject_name:{}", max_len), || {
                subject_name_rules(max_len)
            });
        let entries = ctx.rule_cache.get_or_build("score_entry", score_entry_rules);
        Self { names, entries }
    }

    /// Validate every subject, keeping the ones that pass.
    ///
    /// Subjects are visited in name order so that error lists are stable.
    pub fn partition(&self, scores: &SubjectScores) -> Result<ScoresPartition> {
        let mut subjects: Vec<(&SubjectName, &ScoreEntry)> = scores.iter().collect();
        subjects.sort_by(|a, b| a.0.cmp(b.0));

        let mut partition = ScoresPartition::default();
        for (name, entry) in subjects {
            let (name_errors, name_meta) = self.names.evaluate(name, None)?;
            let (entry_errors, entry_meta) = self.entries.evaluate(entry, None)?;

            partition.metadata.rules_evaluated +=
                name_meta.rules_evaluated + entry_meta.rules_evaluated;
            partition.metadata.rules_skipped += name_meta.rules_skipped + entry_meta.rules_skipped;

            if name_errors.is_empty() && entry_errors.is_empty() {
                partition.valid.insert(name.clone(), *entry);
                continue;
            }

            partition.errors.extend(
                name_errors
                    .into_iter()
                    .chain(entry_errors)
                    .map(|error| error.prefixed(name.as_str())),
            );
            partition.rejected.push(name.clone());
        }

        if !partition.rejected.is_empty() {
            warn!(
                rejected = partition.rejected.len(),
                errors = partition.errors.len(),
                "Subjects failed validation"
            );
        }
        debug!(
            subjects = scores.len(),
            valid = partition.valid.len(),
            "Validated subject scores"
        );
        Ok(partition)
    }

    /// Whole-map result: valid only when every subject passed.
    pub fn validate(&self, scores: &SubjectScores) -> Result<ValidationResult<SubjectScores>> {
        let partition = self.partition(scores)?;
        Ok(ValidationResult::from_errors(
            scores.clone(),
            partition.errors,
            partition.metadata,
        ))
    }
}

/// Run the name and entry rules over every subject of `scores`.
pub fn validate_subject_scores(
    scores: &SubjectScores,
    ctx: &ValidationContext,
) -> Result<ValidationResult<SubjectScores>> {
    SubjectScoresValidator::new(ctx).validate(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::rule_cache::RuleCacheConfig;
    use pretty_assertions::assert_eq;

    fn ctx() -> ValidationContext {
        ValidationContext::new(
            DEFAULT_MAX_SUBJECT_NAME_LEN,
            Arc::new(RuleSetCache::new(RuleCacheConfig::default())),
        )
    }

    fn codes(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.code.as_str()).collect()
    }

    #[test]
    fn test_valid_entry_passes() {
        let validator = score_entry_rules().build();
        let entry = ScoreEntry::new(80.0, 150.0).with_max(100.0, 200.0);
        assert!(validator.validate(&entry, None).unwrap().is_valid());
    }

    #[test]
    fn test_negative_score_reported_per_phase() {
        let validator = score_entry_rules().build();
        let result = validator
            .validate(&ScoreEntry::new(-1.0, -2.0), None)
            .unwrap();

        let fields: Vec<&str> = result.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["commonTest", "secondTest"]);
        assert_eq!(codes(result.errors()), vec!["NEGATIVE_SCORE", "NEGATIVE_SCORE"]);
        // max rules are guarded out without maxima
        assert_eq!(result.metadata().rules_skipped, 4);
    }

    #[test]
    fn test_score_above_max_fails_only_when_max_present() {
        let validator = score_entry_rules().build();
        let entry = ScoreEntry::new(120.0, 10.0).with_max(100.0, 200.0);

        let result = validator.validate(&entry, None).unwrap();
        assert_eq!(codes(result.errors()), vec!["SCORE_EXCEEDS_MAX"]);
        assert_eq!(result.errors()[0].field, "commonTest");

        let unbounded = ScoreEntry::new(120.0, 10.0);
        assert!(validator.validate(&unbounded, None).unwrap().is_valid());
    }

    #[test]
    fn test_non_finite_score() {
        let validator = score_entry_rules().build();
        let result = validator
            .validate(&ScoreEntry::new(f64::NAN, 0.0), None)
            .unwrap();
        assert_eq!(codes(result.errors()), vec!["NON_FINITE_SCORE"]);
    }

    #[test]
    fn test_subject_name_rules() {
        let validator = subject_name_rules(4).build();

        assert!(validator.validate(&SubjectName::from("英語R"), None).unwrap().is_valid());

        let empty = validator.validate(&SubjectName::from("  "), None).unwrap();
        assert_eq!(
            codes(empty.errors()),
            vec!["EMPTY_SUBJECT_NAME", "SUBJECT_NAME_WHITESPACE"]
        );

        let long = validator.validate(&SubjectName::from("物理基礎化学"), None).unwrap();
        assert_eq!(codes(long.errors()), vec!["SUBJECT_NAME_TOO_LONG"]);

        let control = validator.validate(&SubjectName::from("数\t学"), None).unwrap();
        assert_eq!(codes(control.errors()), vec!["SUBJECT_NAME_CONTROL_CHARS"]);
    }

    #[test]
    fn test_weighted_record_conditional_weight() {
        let validator = weighted_record_rules().build();

        let unweighted = WeightedScoreRecord::new("数学", TestType::Common, 50.0);
        let result = validator.validate(&unweighted, None).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.metadata().rules_skipped, 3);

        let heavy = unweighted.clone().with_weight(1.5);
        let result = validator.validate(&heavy, None).unwrap();
        assert_eq!(codes(result.errors()), vec!["WEIGHT_OUT_OF_RANGE"]);

        let over_max = unweighted.with_max_score(40.0).with_weight(0.5);
        let result = validator.validate(&over_max, None).unwrap();
        assert_eq!(codes(result.errors()), vec!["SCORE_EXCEEDS_MAX"]);
    }

    #[test]
    fn test_category_total_dependency() {
        let validator = category_total_rules().build();
        let share = CategoryTotal {
            category: Category::from("英語"),
            total: 600.0,
        };

        let deps = Dependencies::new().with(GRAND_TOTAL, 500.0);
        let result = validator.validate(&share, Some(&deps)).unwrap();
        assert_eq!(codes(result.errors()), vec!["CATEGORY_EXCEEDS_TOTAL"]);

        let deps = Dependencies::new().with(GRAND_TOTAL, 600.0);
        assert!(validator.validate(&share, Some(&deps)).unwrap().is_valid());
    }

    #[test]
    fn test_category_total_tolerance_scales_with_magnitude() {
        let validator = category_total_rules().build();
        let deps = Dependencies::new().with(GRAND_TOTAL, 1e16);

        // One ulp above a large grand total is summation noise.
        let share = CategoryTotal {
            category: Category::from("X"),
            total: 1e16 + 2.0,
        };
        assert!(validator.validate(&share, Some(&deps)).unwrap().is_valid());

        let share = CategoryTotal {
            category: Category::from("X"),
            total: 1.001e16,
        };
        assert!(!validator.validate(&share, Some(&deps)).unwrap().is_valid());

        assert!(fits_within(500.0 + 1e-10, 500.0));
        assert!(!fits_within(500.001, 500.0));
    }

    #[test]
    fn test_partition_prefixes_fields_and_keeps_valid_subjects() {
        let scores = SubjectScores::new()
            .with("英語R", ScoreEntry::new(100.0, 200.0))
            .with("英語L", ScoreEntry::new(-5.0, 100.0))
            .with("数学", ScoreEntry::new(1.0, f64::INFINITY));

        let partition = SubjectScoresValidator::new(&ctx()).partition(&scores).unwrap();

        assert_eq!(partition.valid.len(), 1);
        assert!(partition.valid.contains("英語R"));
        assert_eq!(
            partition.rejected,
            vec![SubjectName::from("数学"), SubjectName::from("英語L")]
        );
        let fields: Vec<&str> = partition.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["数学.secondTest", "英語L.commonTest"]);
    }

    #[test]
    fn test_validate_subject_scores_whole_map() {
        let valid = SubjectScores::new().with("英語R", ScoreEntry::new(100.0, 200.0));
        let result = validate_subject_scores(&valid, &ctx()).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.data(), Some(&valid));

        let invalid = valid.with("英語L", ScoreEntry::new(-1.0, 0.0));
        let result = validate_subject_scores(&invalid, &ctx()).unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].field, "英語L.commonTest");
    }

    #[test]
    fn test_rule_sets_are_shared_through_the_cache() {
        let ctx = ctx();
        let _first = SubjectScoresValidator::new(&ctx);
        let _second = SubjectScoresValidator::new(&ctx);

        let stats = ctx.rule_cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.hits, 2);
    }
}
