//! Category derivation from subject names.
//!
//! A category is the subject family once the trailing test-variant suffix is
//! stripped: `英語R` (reading) and `英語L` (listening) both collapse into
//! `英語`. The suffix set is `R`/`L` in ASCII or full width, and the suffix is
//! only stripped when at least one character remains.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static VARIANT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)[RLＲＬ]$").expect("variant suffix pattern is valid"));

/// Subject family used for grouping and style lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the category of a subject name. Pure and total.
pub fn extract_category(subject: &str) -> Category {
    match VARIANT_SUFFIX.captures(subject).and_then(|caps| caps.get(1)) {
        Some(base) => Category::new(base.as_str()),
        None => Category::new(subject),
    }
}
