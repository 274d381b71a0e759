//! # Custody Events
//!
//! A `CustodyEvent` is a write-once fact. The persisted representation is a
//! JSON object with required keys `action`, `performed_by`, `timestamp` and
//! optional keys `location`, `notes`, `hash_verification`.
//!
//! Optional keys follow the sparse convention: a key is present only when a
//! value was supplied, and is omitted (never `null`, never `""`) otherwise.
//! Consumers distinguish "absent" from "empty string", so this is part of
//! the storage contract.

use fcm_core::{Timestamp, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::CustodyAction;

/// Notes attached to the synthetic and intake collection entries.
pub const INITIAL_COLLECTION_NOTES: &str = "Initial evidence collection";

/// One immutable entry in a chain-of-custody log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyEvent {
    /// What was done.
    pub action: CustodyAction,
    /// Who did it.
    pub performed_by: UserId,
    /// When it was recorded.
    pub timestamp: Timestamp,
    /// Where it happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-text remarks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Hash value recorded with the entry. Meaningful for `Hash Verified`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_verification: Option<String>,
}

impl CustodyEvent {
    /// Build an event from an action, actor, time, and optional details.
    pub fn new(
        action: CustodyAction,
        performed_by: UserId,
        timestamp: Timestamp,
        details: EntryDetails,
    ) -> Self {
        let details = details.normalized();
        Self {
            action,
            performed_by,
            timestamp,
            location: details.location,
            notes: details.notes,
            hash_verification: details.hash_verification,
        }
    }

    /// The collection entry standing for the original collection act.
    ///
    /// Used both as the synthetic seed of an empty log (never persisted) and
    /// as the single entry written at evidence intake.
    pub fn collection(collected_by: UserId, collected_at: Timestamp) -> Self {
        Self {
            action: CustodyAction::Collected,
            performed_by: collected_by,
            timestamp: collected_at,
            location: None,
            notes: Some(INITIAL_COLLECTION_NOTES.to_string()),
            hash_verification: None,
        }
    }
}

/// Optional inputs supplied with a new custody entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDetails {
    /// Where the action took place.
    #[serde(default)]
    pub location: Option<String>,
    /// Free-text remarks.
    #[serde(default)]
    pub notes: Option<String>,
    /// Hash value, typically a SHA-256 hex digest.
    #[serde(default)]
    pub hash_verification: Option<String>,
}

impl EntryDetails {
    /// Drop empty strings so they are treated as not supplied.
    ///
    /// Any other value, whitespace included, is kept verbatim.
    pub fn normalized(self) -> Self {
        Self {
            location: supplied(self.location),
            notes: supplied(self.notes),
            hash_verification: supplied(self.hash_verification),
        }
    }
}

fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// One custody log entry exactly as persisted.
///
/// Appends carry earlier entries through untouched, so keys this crate does
/// not model, explicit `null`s and the original timestamp spelling all
/// survive a write-back. Only the newly appended entry is encoded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredEntry(Value);

impl StoredEntry {
    /// Wrap a value read from storage.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Decode into a typed event.
    pub fn decode(&self) -> Result<CustodyEvent, serde_json::Error> {
        CustodyEvent::deserialize(&self.0)
    }
}

impl From<&CustodyEvent> for StoredEntry {
    fn from(event: &CustodyEvent) -> Self {
        let mut entry = Map::new();
        entry.insert("action".into(), Value::from(event.action.label()));
        entry.insert("performed_by".into(), Value::from(event.performed_by.as_str()));
        entry.insert("timestamp".into(), Value::from(event.timestamp.to_iso8601()));
        let optional = [
            ("location", &event.location),
            ("notes", &event.notes),
            ("hash_verification", &event.hash_verification),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                entry.insert(key.into(), Value::from(value.as_str()));
            }
        }
        Self(Value::Object(entry))
    }
}
