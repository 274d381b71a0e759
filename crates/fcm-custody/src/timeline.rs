//! # Timeline
//!
//! Display-ready view of a custody log: each event paired with the resolved
//! identity of its performer. Entries are in stored order (oldest first);
//! [`Timeline::newest_first`] gives the reversed display order.

use fcm_core::{EvidenceId, UserId};
use serde::Serialize;

use crate::classify::{classify_action, ActionClass};
use crate::event::CustodyEvent;
use crate::store::ActorProfile;

/// Display name used when a performer id has no profile.
pub const UNKNOWN_ACTOR_NAME: &str = "Unknown User";

/// Number of hash characters shown before the ellipsis.
const HASH_PREVIEW_CHARS: usize = 16;

/// Display identity of an event's performer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedActor {
    pub user_id: UserId,
    pub display_name: String,
    pub contact: Option<String>,
    /// `false` when this is the placeholder identity.
    pub resolved: bool,
}

impl ResolvedActor {
    pub fn from_profile(user_id: UserId, profile: ActorProfile) -> Self {
        Self {
            user_id,
            display_name: profile.display_name,
            contact: profile.contact,
            resolved: true,
        }
    }

    /// Placeholder for an id with no profile.
    pub fn unknown(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: UNKNOWN_ACTOR_NAME.to_string(),
            contact: None,
            resolved: false,
        }
    }

    /// Upper-cased first letter of each name part; `??` for the placeholder.
    pub fn initials(&self) -> String {
        if !self.resolved {
            return "??".to_string();
        }
        let initials: String = self
            .display_name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            "??".to_string()
        } else {
            initials
        }
    }
}

/// One event with its resolved performer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub event: CustodyEvent,
    pub actor: ResolvedActor,
}

impl TimelineEntry {
    pub fn classification(&self) -> ActionClass {
        classify_action(self.event.action.label())
    }

    /// Timestamp formatted for operators.
    pub fn display_time(&self) -> String {
        self.event.timestamp.to_display()
    }

    /// Shortened hash for display, if the entry carries one.
    pub fn hash_preview(&self) -> Option<String> {
        self.event.hash_verification.as_deref().map(hash_preview)
    }
}

/// Shorten a hash to its first 16 characters followed by `...`.
pub fn hash_preview(hash: &str) -> String {
    let head: String = hash.chars().take(HASH_PREVIEW_CHARS).collect();
    format!("{head}...")
}

/// The resolved custody timeline of one evidence item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub evidence_id: EvidenceId,
    pub entries: Vec<TimelineEntry>,
    /// `true` when the stored log was empty and the single entry is the
    /// derived collection seed.
    pub synthetic_seed: bool,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in display order, most recent first.
    pub fn newest_first(&self) -> Vec<&TimelineEntry> {
        self.entries.iter().rev().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::CustodyAction;
    use crate::event::EntryDetails;
    use fcm_core::Timestamp;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn entry(action: CustodyAction, at: &str) -> TimelineEntry {
        TimelineEntry {
            event: CustodyEvent::new(
                action,
                user("u1"),
                Timestamp::parse(at).unwrap(),
                EntryDetails::default(),
            ),
            actor: ResolvedActor::unknown(user("u1")),
        }
    }

    #[test]
    fn initials_from_full_name() {
        let actor = ResolvedActor::from_profile(
            user("u1"),
            ActorProfile {
                display_name: "dana maria reyes".into(),
                contact: None,
            },
        );
        assert_eq!(actor.initials(), "DMR");
    }

    #[test]
    fn placeholder_has_question_mark_initials() {
        let actor = ResolvedActor::unknown(user("ghost"));
        assert_eq!(actor.display_name, UNKNOWN_ACTOR_NAME);
        assert_eq!(actor.initials(), "??");
        assert!(actor.contact.is_none());
    }

    #[test]
    fn blank_profile_name_falls_back_to_question_marks() {
        let actor = ResolvedActor::from_profile(
            user("u1"),
            ActorProfile {
                display_name: "   ".into(),
                contact: None,
            },
        );
        assert_eq!(actor.initials(), "??");
    }

    #[test]
    fn hash_preview_truncates_to_sixteen_chars() {
        let digest = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert_eq!(hash_preview(digest), "e3b0c44298fc1c14...");
    }

    #[test]
    fn short_hash_preview_keeps_whole_value() {
        assert_eq!(hash_preview("abc"), "abc...");
    }

    #[test]
    fn entry_exposes_display_time_and_classification() {
        let e = entry(CustodyAction::Stored, "2026-03-09T07:45:12Z");
        assert_eq!(e.display_time(), "Mar 9, 2026 07:45");
        assert_eq!(
            e.classification().category,
            crate::classify::ActionCategory::Store
        );
        assert_eq!(e.hash_preview(), None);
    }

    #[test]
    fn newest_first_reverses_stored_order() {
        let timeline = Timeline {
            evidence_id: EvidenceId::new(),
            entries: vec![
                entry(CustodyAction::Collected, "2026-01-01T00:00:00Z"),
                entry(CustodyAction::Sealed, "2026-01-02T00:00:00Z"),
                entry(CustodyAction::Stored, "2026-01-03T00:00:00Z"),
            ],
            synthetic_seed: false,
        };
        let labels: Vec<&str> = timeline
            .newest_first()
            .iter()
            .map(|e| e.event.action.label())
            .collect();
        assert_eq!(
            labels,
            vec!["Evidence Stored", "Evidence Sealed", "Evidence Collected"]
        );
        assert_eq!(timeline.entries[0].event.action, CustodyAction::Collected);
    }
}
