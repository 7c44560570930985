//! Rule evaluation.
//!
//! A [`Validator`] is a frozen [`RuleSet`] plus an optional cache key. Every
//! rule is visited and every failure collected; nothing short-circuits.

use crate::errors::{Result, ScoremapError};
use crate::validation::result::{ValidationError, ValidationMetadata, ValidationResult};
use crate::validation::rules::{Dependencies, Rule, RuleSet};
use std::sync::Arc;
use tracing::debug;

/// Evaluates a shared rule set against candidate values.
pub struct Validator<T> {
    rules: Arc<RuleSet<T>>,
    key: Option<String>,
}

impl<T> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            key: self.key.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Validator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("key", &self.key)
            .field("checks", &self.rules.len())
            .finish()
    }
}

impl<T> RuleSet<T> {
    /// Freeze the rule set into a validator.
    pub fn build(self) -> Validator<T> {
        Validator::new(Arc::new(self))
    }
}

impl<T> Validator<T> {
    pub fn new(rules: Arc<RuleSet<T>>) -> Self {
        Self { rules, key: None }
    }

    /// Tag results with the id the rule set is cached under.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn rule_set(&self) -> &Arc<RuleSet<T>> {
        &self.rules
    }

    /// Run every rule and collect every failure, in rule order.
    ///
    /// Returns the errors and the evaluation counts. Fails only when a
    /// dependency value is not finite.
    pub fn evaluate(
        &self,
        value: &T,
        dependencies: Option<&Dependencies>,
    ) -> Result<(Vec<ValidationError>, ValidationMetadata)> {
        let empty = Dependencies::new();
        let dependencies = dependencies.unwrap_or(&empty);

        if let Some((key, v)) = dependencies.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ScoremapError::System(format!(
                "dependency `{}` is not a finite number ({})",
                key, v
            )));
        }

        let mut errors = Vec::new();
        let mut metadata = ValidationMetadata {
            rule_set_key: self.key.clone(),
            ..ValidationMetadata::default()
        };

        for rule in self.rules.rules() {
            match rule {
                Rule::Basic(rule) => {
                    metadata.rules_evaluated += 1;
                    if !rule.passes(value) {
                        errors.push(rule.failure());
                    }
                }
                Rule::Conditional { guard, rules } => {
                    if guard(value) {
                        metadata.rules_evaluated += rules.len();
                        errors.extend(
                            rules
                                .iter()
                                .filter(|rule| !rule.passes(value))
                                .map(|rule| rule.failure()),
                        );
                    } else {
                        metadata.rules_skipped += rules.len();
                    }
                }
                Rule::Dependency(rule) => {
                    metadata.rules_evaluated += 1;
                    errors.extend(rule.evaluate(value, dependencies));
                }
            }
        }

        Ok((errors, metadata))
    }

    /// Evaluate and report the outcome as a result carrying a copy of the value.
    pub fn validate(
        &self,
        value: &T,
        dependencies: Option<&Dependencies>,
    ) -> Result<ValidationResult<T>>
    where
        T: Clone,
    {
        let (errors, metadata) = self.evaluate(value, dependencies)?;
        debug!(
            evaluated = metadata.rules_evaluated,
            skipped = metadata.rules_skipped,
            errors = errors.len(),
            "Validated value"
        );
        Ok(ValidationResult::from_errors(value.clone(), errors, metadata))
    }

    /// Fail-fast entry point: any rule failure becomes `ScoremapError::Validation`.
    pub fn validate_strict(&self, value: &T, dependencies: Option<&Dependencies>) -> Result<T>
    where
        T: Clone,
    {
        self.validate(value, dependencies)?.into_result()
    }
}
