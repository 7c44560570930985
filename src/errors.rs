//! Error types shared across the pipeline.
//!
//! There are two layers:
//! - [`ErrorKind`] and [`Severity`] classify the structured records that are
//!   surfaced *inside* results (validation errors, chart errors). Those are
//!   recovered locally and never abort a computation.
//! - [`ScoremapError`] is the `Err` side of operations that genuinely fail:
//!   strict validation at a boundary, configuration loading, I/O.
//!
//! # Error Codes
//!
//! Codes are assigned by category:
//! - SM001-SM009: validation
//! - SM010-SM019: chart transform
//! - SM020-SM029: calculation
//! - SM030-SM039: cache
//! - SM040-SM049: configuration
//! - SM050-SM059: I/O and serialization
//! - SM090-SM099: system

use crate::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Category of a failure, independent of the concrete error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A rule failed on a field.
    Validation,
    /// Chart-data construction failed.
    Transform,
    /// Division or aggregation anomaly.
    Calculation,
    /// Storage operation failed.
    Cache,
    /// Unexpected internal fault.
    System,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Transform => "TRANSFORM",
            Self::Calculation => "CALCULATION",
            Self::Cache => "CACHE",
            Self::System => "SYSTEM",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a reported problem is. Ordered `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable error code for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// Validation error - one or more rules failed
    pub const VALIDATION_FAILED: ErrorCode = ErrorCode("SM001");
    /// Transform error - chart data could not be built
    pub const TRANSFORM_FAILED: ErrorCode = ErrorCode("SM010");
    /// Calculation error - non-finite or inconsistent aggregate
    pub const CALCULATION_FAILED: ErrorCode = ErrorCode("SM020");
    /// Cache error - storage operation failed
    pub const CACHE_FAILED: ErrorCode = ErrorCode("SM030");
    /// Config error - invalid or unreadable configuration
    pub const CONFIG_INVALID: ErrorCode = ErrorCode("SM040");
    /// I/O error - generic
    pub const IO_GENERIC: ErrorCode = ErrorCode("SM050");
    /// Serialization error - JSON or TOML
    pub const SERIALIZATION: ErrorCode = ErrorCode("SM051");
    /// System error - unexpected internal fault
    pub const SYSTEM: ErrorCode = ErrorCode("SM090");

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Main error type for scoremap operations
#[derive(Debug, Error)]
pub enum ScoremapError {
    /// Aggregated validation failure raised by strict entry points
    #[error("Validation failed with {count} error(s): {summary}")]
    Validation {
        count: usize,
        summary: String,
        errors: Vec<ValidationError>,
    },

    /// Chart-data construction errors
    #[error("Transform error: {0}")]
    Transform(String),

    /// Aggregation anomalies
    #[error("Calculation error: {0}")]
    Calculation(String),

    /// Cache operation errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Unexpected internal faults
    #[error("System error: {0}")]
    System(String),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// How many messages a validation summary lists before eliding the rest.
const SUMMARY_LIMIT: usize = 3;

impl ScoremapError {
    /// Build a validation error from an aggregated error list.
    pub fn validation(errors: Vec<ValidationError>) -> Self {
        let mut summary = errors
            .iter()
            .take(SUMMARY_LIMIT)
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        if errors.len() > SUMMARY_LIMIT {
            summary.push_str(&format!(" (+{} more)", errors.len() - SUMMARY_LIMIT));
        }

        Self::Validation {
            count: errors.len(),
            summary,
            errors,
        }
    }

    /// Create a configuration error, optionally tied to a file.
    pub fn config(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config {
            message: message.into(),
            path,
        }
    }

    /// The kind this error reports as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Transform(_) => ErrorKind::Transform,
            Self::Calculation(_) => ErrorKind::Calculation,
            Self::Cache(_) => ErrorKind::Cache,
            Self::Config { .. }
            | Self::System(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Toml(_) => ErrorKind::System,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::VALIDATION_FAILED,
            Self::Transform(_) => ErrorCode::TRANSFORM_FAILED,
            Self::Calculation(_) => ErrorCode::CALCULATION_FAILED,
            Self::Cache(_) => ErrorCode::CACHE_FAILED,
            Self::Config { .. } => ErrorCode::CONFIG_INVALID,
            Self::Io(_) => ErrorCode::IO_GENERIC,
            Self::Json(_) | Self::Toml(_) => ErrorCode::SERIALIZATION,
            Self::System(_) => ErrorCode::SYSTEM,
        }
    }

    /// The individual validation errors, empty for every other variant.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Validation { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, ScoremapError>;
