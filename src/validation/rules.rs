//! Rule definitions and the rule-set builder.
//!
//! A [`RuleSet`] is an immutable, ordered list of tagged [`Rule`]s:
//!
//! - [`Rule::Basic`]: always evaluated
//! - [`Rule::Conditional`]: evaluated only when its guard holds for the value
//! - [`Rule::Dependency`]: evaluated against a side map of sibling values
//!
//! Rule sets are assembled with a consuming builder and frozen once built:
//!
//! ```rust
//! use scoremap::core::ScoreEntry;
//! use scoremap::validation::{RuleCategory, RuleSet, ValidationRule};
//!
//! let rules = RuleSet::<ScoreEntry>::new()
//!     .with_rule(
//!         ValidationRule::new(
//!             "commonTest",
//!             "NEGATIVE_SCORE",
//!             "must be non-negative",
//!             |e: &ScoreEntry| e.common_test >= 0.0,
//!         )
//!         .with_category(RuleCategory::Range),
//!     )
//!     .with_conditional_rules(
//!         |e: &ScoreEntry| e.max_common_test.is_some(),
//!         vec![ValidationRule::new(
//!             "commonTest",
//!             "SCORE_EXCEEDS_MAX",
//!             "exceeds maximum",
//!             |e: &ScoreEntry| e.max_common_test.map_or(true, |max| e.common_test <= max),
//!         )],
//!     );
//! assert_eq!(rules.len(), 2);
//! ```

use crate::errors::Severity;
use crate::validation::result::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use stillwater::predicate::Predicate;

/// Predicate over a candidate value.
pub type Condition<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Predicate over a candidate value and its already-computed siblings.
pub type DependencyCondition<T> = Arc<dyn Fn(&T, &Dependencies) -> bool + Send + Sync>;

/// What aspect of the value a rule checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Format,
    Required,
    Range,
    Calculation,
    Dependency,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Required => "required",
            Self::Range => "range",
            Self::Calculation => "calculation",
            Self::Dependency => "dependency",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named sibling values a dependency rule may consult (e.g. `grand_total`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dependencies(BTreeMap<String, f64>);

impl Dependencies {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}

/// A single check with the error it reports on failure.
pub struct ValidationRule<T> {
    pub field: String,
    pub code: String,
    pub message: String,
    pub severity: Severity,
    pub category: RuleCategory,
    condition: Condition<T>,
}

impl<T> ValidationRule<T> {
    /// Create a rule that passes when `condition` returns true.
    ///
    /// Defaults to `Severity::Error` and `RuleCategory::Format`.
    pub fn new<F>(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        condition: F,
    ) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
            severity: Severity::Error,
            category: RuleCategory::Format,
            condition: Arc::new(condition),
        }
    }

    /// Create a rule from a stillwater predicate applied to a projection of the value.
    pub fn from_predicate<U, P, G>(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        project: G,
        predicate: P,
    ) -> Self
    where
        P: Predicate<U> + Send + Sync + 'static,
        G: Fn(&T) -> U + Send + Sync + 'static,
    {
        Self::new(field, code, message, move |value: &T| {
            predicate.check(&project(value))
        })
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    pub fn passes(&self, value: &T) -> bool {
        (self.condition)(value)
    }

    pub(crate) fn failure(&self) -> ValidationError {
        ValidationError::new(
            self.field.clone(),
            self.message.clone(),
            self.code.clone(),
            self.severity,
            self.category,
        )
    }
}

impl<T> Clone for ValidationRule<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            code: self.code.clone(),
            message: self.message.clone(),
            severity: self.severity,
            category: self.category,
            condition: Arc::clone(&self.condition),
        }
    }
}

impl<T> fmt::Debug for ValidationRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("field", &self.field)
            .field("code", &self.code)
            .field("severity", &self.severity)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// A rule that needs sibling values to decide.
pub struct DependencyRule<T> {
    pub field: String,
    pub code: String,
    pub message: String,
    pub severity: Severity,
    /// Keys that must be present in [`Dependencies`].
    pub requires: Vec<String>,
    condition: DependencyCondition<T>,
}

impl<T> DependencyRule<T> {
    pub fn new<F>(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        requires: &[&str],
        condition: F,
    ) -> Self
    where
        F: Fn(&T, &Dependencies) -> bool + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
            severity: Severity::Error,
            requires: requires.iter().map(|key| key.to_string()).collect(),
            condition: Arc::new(condition),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Evaluate the rule. A missing required key is itself a failure.
    pub(crate) fn evaluate(
        &self,
        value: &T,
        dependencies: &Dependencies,
    ) -> Option<ValidationError> {
        if let Some(missing) = self
            .requires
            .iter()
            .find(|key| dependencies.get(key).is_none())
        {
            return Some(
                ValidationError::new(
                    self.field.clone(),
                    format!("missing dependency `{}`", missing),
                    "MISSING_DEPENDENCY",
                    self.severity,
                    RuleCategory::Dependency,
                )
                .with_metadata("rule", self.code.clone()),
            );
        }

        if (self.condition)(value, dependencies) {
            None
        } else {
            Some(ValidationError::new(
                self.field.clone(),
                self.message.clone(),
                self.code.clone(),
                self.severity,
                RuleCategory::Dependency,
            ))
        }
    }
}

impl<T> Clone for DependencyRule<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            code: self.code.clone(),
            message: self.message.clone(),
            severity: self.severity,
            requires: self.requires.clone(),
            condition: Arc::clone(&self.condition),
        }
    }
}

impl<T> fmt::Debug for DependencyRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRule")
            .field("field", &self.field)
            .field("code", &self.code)
            .field("requires", &self.requires)
            .finish_non_exhaustive()
    }
}

/// Tagged rule variants evaluated by the validator.
pub enum Rule<T> {
    Basic(ValidationRule<T>),
    Conditional {
        guard: Condition<T>,
        rules: Vec<ValidationRule<T>>,
    },
    Dependency(DependencyRule<T>),
}

impl<T> Rule<T> {
    /// Number of individual checks this entry contributes.
    pub fn check_count(&self) -> usize {
        match self {
            Rule::Basic(_) | Rule::Dependency(_) => 1,
            Rule::Conditional { rules, .. } => rules.len(),
        }
    }
}

impl<T> Clone for Rule<T> {
    fn clone(&self) -> Self {
        match self {
            Rule::Basic(rule) => Rule::Basic(rule.clone()),
            Rule::Conditional { guard, rules } => Rule::Conditional {
                guard: Arc::clone(guard),
                rules: rules.clone(),
            },
            Rule::Dependency(rule) => Rule::Dependency(rule.clone()),
        }
    }
}

impl<T> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Basic(rule) => f.debug_tuple("Basic").field(rule).finish(),
            Rule::Conditional { rules, .. } => {
                f.debug_struct("Conditional").field("rules", rules).finish_non_exhaustive()
            }
            Rule::Dependency(rule) => f.debug_tuple("Dependency").field(rule).finish(),
        }
    }
}

/// Ordered, immutable collection of rules for one value type.
pub struct RuleSet<T> {
    rules: Vec<Rule<T>>,
}

impl<T> Default for RuleSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RuleSet<T> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add an unconditional rule.
    pub fn with_rule(mut self, rule: ValidationRule<T>) -> Self {
        self.rules.push(Rule::Basic(rule));
        self
    }

    /// Add rules that only apply when `guard` holds for the candidate value.
    pub fn with_conditional_rules<G>(mut self, guard: G, rules: Vec<ValidationRule<T>>) -> Self
    where
        G: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule::Conditional {
            guard: Arc::new(guard),
            rules,
        });
        self
    }

    /// Add a rule that consults sibling values.
    pub fn with_dependency_rule(mut self, rule: DependencyRule<T>) -> Self {
        self.rules.push(Rule::Dependency(rule));
        self
    }

    /// Append every rule of `other` after the rules already present.
    pub fn extend(mut self, other: RuleSet<T>) -> Self {
        self.rules.extend(other.rules);
        self
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    /// Number of individual checks across all entries.
    pub fn len(&self) -> usize {
        self.rules.iter().map(Rule::check_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn has_dependency_rules(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| matches!(rule, Rule::Dependency(_)))
    }
}

impl<T> Clone for RuleSet<T> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<T> fmt::Debug for RuleSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.rules).finish()
    }
}
