//! # Custody Actions
//!
//! The handling actions an operator can record against an evidence item.
//! The stored form of an action is its display label (`"Evidence Sealed"`),
//! so the label table below is a storage contract, not just presentation.
//!
//! Reading never fails: a stored label that matches no known action is
//! carried as [`CustodyAction::Custom`]. Validation of custom labels
//! happens at the append boundary, see [`CustodyAction::validate`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LedgerError;

/// Label of the catalogue entry that asks the operator for a free-form label.
pub const CUSTOM_ACTION_LABEL: &str = "Custom Action";

/// A custody action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CustodyAction {
    /// Initial collection of the item.
    Collected,
    /// Handed from one custodian to another.
    Transferred,
    /// Examined by an analyst.
    Examined,
    /// Analyzed (tooling or lab work).
    Analyzed,
    /// Placed into storage.
    Stored,
    /// Content hash re-computed and compared.
    HashVerified,
    /// Photographed.
    Photographed,
    /// Sealed in tamper-evident packaging.
    Sealed,
    /// Released from custody.
    Released,
    /// Operator-supplied label.
    Custom(String),
}

impl CustodyAction {
    /// Every fixed action, in catalogue order.
    pub const FIXED: [CustodyAction; 9] = [
        Self::Collected,
        Self::Transferred,
        Self::Examined,
        Self::Analyzed,
        Self::Stored,
        Self::HashVerified,
        Self::Photographed,
        Self::Sealed,
        Self::Released,
    ];

    /// Persisted and displayed label.
    pub fn label(&self) -> &str {
        match self {
            Self::Custom(label) => label,
            fixed => Self::fixed_label(fixed),
        }
    }

    /// Map a stored label back to an action. Unknown labels become `Custom`.
    pub fn from_label(label: &str) -> Self {
        Self::FIXED
            .iter()
            .find(|action| action.label() == label)
            .cloned()
            .unwrap_or_else(|| Self::Custom(label.to_string()))
    }

    /// Resolve an operator's catalogue selection.
    ///
    /// Selecting [`CUSTOM_ACTION_LABEL`] uses `custom_label` as the action;
    /// any other selection is looked up with [`CustodyAction::from_label`].
    /// The result still has to pass [`CustodyAction::validate`].
    pub fn from_selection(selection: &str, custom_label: Option<&str>) -> Self {
        if selection == CUSTOM_ACTION_LABEL {
            Self::Custom(custom_label.unwrap_or_default().to_string())
        } else {
            Self::from_label(selection)
        }
    }

    /// Labels offered to operators when recording a new entry.
    ///
    /// Collection is recorded at intake, so it is not offered here.
    pub fn selectable_labels() -> Vec<&'static str> {
        let mut labels: Vec<&'static str> = Self::FIXED
            .iter()
            .filter(|action| **action != Self::Collected)
            .map(Self::fixed_label)
            .collect();
        labels.push(CUSTOM_ACTION_LABEL);
        labels
    }

    /// Check that the action resolves to a non-empty label.
    pub fn validate(&self) -> Result<(), LedgerError> {
        match self {
            Self::Custom(label) if label.trim().is_empty() => Err(LedgerError::Validation(
                "custom action requires a non-empty label".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Whether this is an operator-supplied label.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Static label of a fixed action; the catalogue entry for `Custom`.
    fn fixed_label(action: &CustodyAction) -> &'static str {
        match action {
            Self::Collected => "Evidence Collected",
            Self::Transferred => "Evidence Transferred",
            Self::Examined => "Evidence Examined",
            Self::Analyzed => "Evidence Analyzed",
            Self::Stored => "Evidence Stored",
            Self::HashVerified => "Hash Verified",
            Self::Photographed => "Evidence Photographed",
            Self::Sealed => "Evidence Sealed",
            Self::Released => "Evidence Released",
            Self::Custom(_) => CUSTOM_ACTION_LABEL,
        }
    }
}

impl std::fmt::Display for CustodyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for CustodyAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for CustodyAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_label() {
        for action in CustodyAction::FIXED {
            assert_eq!(CustodyAction::from_label(action.label()), action);
        }
    }

    #[test]
    fn unknown_label_becomes_custom() {
        assert_eq!(
            CustodyAction::from_label("Sent to Lab 3"),
            CustodyAction::Custom("Sent to Lab 3".into())
        );
    }

    #[test]
    fn custom_label_matching_fixed_reads_back_as_fixed() {
        let json = serde_json::to_string(&CustodyAction::Custom("Evidence Sealed".into())).unwrap();
        let back: CustodyAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CustodyAction::Sealed);
    }

    #[test]
    fn serializes_as_label_string() {
        let json = serde_json::to_string(&CustodyAction::HashVerified).unwrap();
        assert_eq!(json, "\"Hash Verified\"");
    }

    #[test]
    fn selection_of_custom_uses_custom_label() {
        let action = CustodyAction::from_selection(CUSTOM_ACTION_LABEL, Some("Court Exhibit"));
        assert_eq!(action, CustodyAction::Custom("Court Exhibit".into()));
    }

    #[test]
    fn selection_of_custom_without_label_fails_validation() {
        let action = CustodyAction::from_selection(CUSTOM_ACTION_LABEL, None);
        assert!(matches!(action.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn whitespace_custom_label_is_invalid() {
        let action = CustodyAction::Custom("  \t ".into());
        assert!(matches!(action.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn fixed_actions_are_valid() {
        for action in CustodyAction::FIXED {
            assert!(action.validate().is_ok());
        }
    }

    #[test]
    fn selectable_labels_skip_collection_and_end_with_custom() {
        let labels = CustodyAction::selectable_labels();
        assert_eq!(labels.len(), 9);
        assert!(!labels.contains(&"Evidence Collected"));
        assert_eq!(labels.first(), Some(&"Evidence Transferred"));
        assert_eq!(labels.last(), Some(&CUSTOM_ACTION_LABEL));
    }
}
