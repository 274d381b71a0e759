//! # Action Classification
//!
//! Maps an action label to presentation metadata (icon and color family).
//! Pure and total: any string classifies, unknown labels fall through to
//! [`ActionCategory::Generic`]. The result is never persisted.
//!
//! Matching is a case-insensitive substring test against an ordered rule
//! table; the first matching rule wins.

use serde::{Deserialize, Serialize};

/// Presentation category of a custody action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Collect,
    Transfer,
    Examine,
    Store,
    Verify,
    Generic,
}

/// Icon family for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionIcon {
    Upload,
    User,
    Document,
    Location,
    Shield,
    Clock,
}

/// Color family for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionColor {
    Primary,
    Blue,
    Purple,
    Green,
    Cyan,
    Muted,
}

/// Result of [`classify_action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionClass {
    pub category: ActionCategory,
    pub icon: ActionIcon,
    pub color: ActionColor,
}

/// Ordered rule table. "examined" and "analyzed" share the Examine rule.
const RULES: &[(&[&str], ActionCategory)] = &[
    (&["collect"], ActionCategory::Collect),
    (&["transfer"], ActionCategory::Transfer),
    (&["exam", "analyz"], ActionCategory::Examine),
    (&["stor"], ActionCategory::Store),
    (&["verif"], ActionCategory::Verify),
];

impl ActionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collect => "collect",
            Self::Transfer => "transfer",
            Self::Examine => "examine",
            Self::Store => "store",
            Self::Verify => "verify",
            Self::Generic => "generic",
        }
    }

    pub fn icon(self) -> ActionIcon {
        match self {
            Self::Collect => ActionIcon::Upload,
            Self::Transfer => ActionIcon::User,
            Self::Examine => ActionIcon::Document,
            Self::Store => ActionIcon::Location,
            Self::Verify => ActionIcon::Shield,
            Self::Generic => ActionIcon::Clock,
        }
    }

    pub fn color(self) -> ActionColor {
        match self {
            Self::Collect => ActionColor::Primary,
            Self::Transfer => ActionColor::Blue,
            Self::Examine => ActionColor::Purple,
            Self::Store => ActionColor::Green,
            Self::Verify => ActionColor::Cyan,
            Self::Generic => ActionColor::Muted,
        }
    }
}

impl ActionIcon {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::User => "user",
            Self::Document => "document",
            Self::Location => "location",
            Self::Shield => "shield",
            Self::Clock => "clock",
        }
    }
}

impl ActionColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Green => "green",
            Self::Cyan => "cyan",
            Self::Muted => "muted",
        }
    }
}

/// Classify an action label.
pub fn classify_action(action: &str) -> ActionClass {
    let lower = action.to_lowercase();
    let category = RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| lower.contains(needle)))
        .map(|(_, category)| *category)
        .unwrap_or(ActionCategory::Generic);
    ActionClass {
        category,
        icon: category.icon(),
        color: category.color(),
    }
}
