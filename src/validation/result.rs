//! Validation outcomes.

use crate::errors::{ErrorKind, Result, ScoremapError, Severity};
use crate::validation::rules::RuleCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use stillwater::{NonEmptyVec, Validation};

/// One failed rule, located by field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Dotted path, e.g. `英語R.commonTest`
    pub field: String,
    pub message: String,
    pub code: String,
    pub severity: Severity,
    pub kind: ErrorKind,
    pub category: RuleCategory,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
        severity: Severity,
        category: RuleCategory,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
            severity,
            kind: ErrorKind::Validation,
            category,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Nest the field under `prefix` (`commonTest` -> `英語R.commonTest`).
    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.field = if self.field.is_empty() {
            prefix.to_string()
        } else {
            format!("{}.{}", prefix, self.field)
        };
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Bookkeeping attached to every result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMetadata {
    /// Checks actually run against the value.
    pub rules_evaluated: usize,
    /// Checks skipped because their guard did not hold.
    pub rules_skipped: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_set_key: Option<String>,
}

/// Outcome of validating one value.
///
/// `data` is present exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult<T> {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    errors: Vec<ValidationError>,
    metadata: ValidationMetadata,
}

impl<T> ValidationResult<T> {
    pub fn success(data: T, metadata: ValidationMetadata) -> Self {
        Self {
            is_valid: true,
            data: Some(data),
            errors: Vec::new(),
            metadata,
        }
    }

    /// A failed result. An empty error list is promoted to success.
    pub fn from_errors(
        data: T,
        errors: Vec<ValidationError>,
        metadata: ValidationMetadata,
    ) -> Self {
        if errors.is_empty() {
            return Self::success(data, metadata);
        }
        Self {
            is_valid: false,
            data: None,
            errors,
            metadata,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    pub fn metadata(&self) -> &ValidationMetadata {
        &self.metadata
    }

    /// Transform the data of a successful result.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ValidationResult<U> {
        ValidationResult {
            is_valid: self.is_valid,
            data: self.data.map(f),
            errors: self.errors,
            metadata: self.metadata,
        }
    }

    /// Convert into an accumulating stillwater validation.
    pub fn into_validation(self) -> Validation<T, NonEmptyVec<ValidationError>> {
        let mut errors = self.errors.into_iter();
        match (self.data, errors.next()) {
            (Some(data), None) => Validation::Success(data),
            (_, Some(head)) => Validation::Failure(NonEmptyVec::new(head, errors.collect())),
            (None, None) => Validation::Failure(NonEmptyVec::new(
                ValidationError::new(
                    "",
                    "validation produced neither data nor errors",
                    "INTERNAL",
                    Severity::Error,
                    RuleCategory::Required,
                ),
                Vec::new(),
            )),
        }
    }

    /// Convert into a `Result`, aggregating every error into one `ScoremapError`.
    pub fn into_result(self) -> Result<T> {
        match self.data {
            Some(data) if self.errors.is_empty() => Ok(data),
            _ => Err(ScoremapError::validation(self.errors)),
        }
    }
}
