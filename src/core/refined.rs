//! Refined types for score invariants
//!
//! Values that have a fixed legal range are checked once at construction and
//! carried as newtypes afterwards, so the calculator never re-checks them.
//!
//! # Available Types
//!
//! - [`WeightFactor`]: weight of an admin-editable score, in [0.0, 1.0]
//!
//! The predicates [`UnitInterval`] and [`NonNegative`] are also used directly
//! by the validation rules.

use serde::{Deserialize, Serialize};
use stillwater::refined::Predicate;

/// Predicate for floating-point values in the unit interval [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitInterval;

impl Predicate<f64> for UnitInterval {
    type Error = &'static str;

    fn check(value: &f64) -> Result<(), Self::Error> {
        if *value >= 0.0 && *value <= 1.0 {
            Ok(())
        } else {
            Err("value must be in range [0.0, 1.0]")
        }
    }
}

/// Predicate for finite, non-negative f64 values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonNegative;

impl Predicate<f64> for NonNegative {
    type Error = &'static str;

    fn check(value: &f64) -> Result<(), Self::Error> {
        if !value.is_finite() {
            Err("value must be a finite number")
        } else if *value < 0.0 {
            Err("value must be non-negative (>= 0.0)")
        } else {
            Ok(())
        }
    }
}

/// Weight applied to a score.
///
/// Valid range: [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightFactor(f64);

impl WeightFactor {
    /// Create a new weight factor, validating it's in [0.0, 1.0].
    pub fn new(value: f64) -> Result<Self, &'static str> {
        UnitInterval::check(&value)?;
        Ok(Self(value))
    }

    pub fn get(&self) -> f64 {
        self.0
    }

    pub fn into_inner(self) -> f64 {
        self.0
    }
}

impl std::ops::Deref for WeightFactor {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for WeightFactor {
    fn default() -> Self {
        Self(1.0)
    }
}
