//! Declarative validation rule engine.
//!
//! Rules are plain data plus a predicate; a [`Validator`] evaluates all of
//! them and reports every failure rather than stopping at the first. Expected
//! failures come back inside a [`ValidationResult`]; only internal faults are
//! returned as `Err`.

pub mod result;
pub mod rule_cache;
pub mod rules;
pub mod score_rules;
pub mod validator;

pub use result::{ValidationError, ValidationMetadata, ValidationResult};
pub use rule_cache::{RuleCacheConfig, RuleCacheStats, RuleSetCache};
pub use rules::{Dependencies, DependencyRule, Rule, RuleCategory, RuleSet, ValidationRule};
pub use score_rules::{
    validate_subject_scores, ScoresPartition, SubjectScoresValidator, ValidationContext,
};
pub use validator::Validator;
