//! Category color and fill-pattern table.

use crate::core::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fill pattern a renderer applies on top of the slice color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    #[default]
    Solid,
    Striped,
    Dotted,
    Crosshatch,
    Diagonal,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Striped => "striped",
            Self::Dotted => "dotted",
            Self::Crosshatch => "crosshatch",
            Self::Diagonal => "diagonal",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStyle {
    pub color: String,
    #[serde(default)]
    pub pattern: PatternKind,
}

impl CategoryStyle {
    pub fn new(color: impl Into<String>, pattern: PatternKind) -> Self {
        Self {
            color: color.into(),
            pattern,
        }
    }
}

impl Default for CategoryStyle {
    fn default() -> Self {
        Self::new("#9E9E9E", PatternKind::Solid)
    }
}

/// Style lookup keyed by category. Unknown categories get the default style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleTable {
    #[serde(default)]
    styles: BTreeMap<Category, CategoryStyle>,
    #[serde(default)]
    default_style: CategoryStyle,
}

impl StyleTable {
    pub fn new(default_style: CategoryStyle) -> Self {
        Self {
            styles: BTreeMap::new(),
            default_style,
        }
    }

    /// Table for the common exam categories.
    pub fn builtin() -> Self {
        Self::default()
            .with("英語", CategoryStyle::new("#4E79A7", PatternKind::Striped))
            .with("数学", CategoryStyle::new("#F28E2B", PatternKind::Dotted))
            .with("国語", CategoryStyle::new("#E15759", PatternKind::Diagonal))
            .with("理科", CategoryStyle::new("#59A14F", PatternKind::Crosshatch))
            .with("社会", CategoryStyle::new("#EDC948", PatternKind::Striped))
    }

    pub fn with(mut self, category: impl Into<Category>, style: CategoryStyle) -> Self {
        self.styles.insert(category.into(), style);
        self
    }

    pub fn with_default(mut self, style: CategoryStyle) -> Self {
        self.default_style = style;
        self
    }

    pub fn style_for(&self, category: &Category) -> &CategoryStyle {
        self.styles.get(category).unwrap_or(&self.default_style)
    }

    pub fn default_style(&self) -> &CategoryStyle {
        &self.default_style
    }

    pub fn categories(&self) -> impl Iterator<Item = (&Category, &CategoryStyle)> {
        self.styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
