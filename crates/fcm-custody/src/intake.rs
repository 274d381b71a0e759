//! # Evidence Intake
//!
//! Helpers for recording a new evidence item from an Android acquisition
//! run: the expected output files, device property parsing, the derived
//! evidence description, and the record created at intake with its
//! single-entry custody log.

use std::collections::BTreeMap;

use fcm_core::{CaseId, EvidenceId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::event::{CustodyEvent, StoredEntry};
use crate::store::NewEvidence;

/// Output files produced by one acquisition run.
pub const ACQUISITION_FILES: [&str; 7] = [
    "device_properties.txt",
    "device_date.txt",
    "battery_status.txt",
    "network_info.txt",
    "installed_packages.txt",
    "storage_info.txt",
    "acquisition.log",
];

/// Maximum number of log characters carried into the summary note.
pub const LOG_SUMMARY_CHARS: usize = 5000;

const LOG_SUMMARY_HEADING: &str = "**Acquisition Log Summary**";
const LOG_TRUNCATED_NOTICE: &str = "...\n\n(Log truncated. See attachment for full log)";

/// Evidence type recorded for device acquisitions.
pub const MOBILE_DEVICE_TYPE: &str = "Mobile Device";

const UNKNOWN_MODEL: &str = "Unknown Device";
const UNKNOWN_VALUE: &str = "Unknown";

/// Acquisition files not present among `present`, in canonical order.
pub fn missing_acquisition_files<'a, I>(present: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = present.into_iter().collect();
    ACQUISITION_FILES
        .iter()
        .copied()
        .filter(|name| !present.contains(name))
        .collect()
}

/// Parse a device property dump.
///
/// Accepts both `key=value` lines (brackets in the value are stripped, the
/// value may contain `=`) and `getprop` style `[key]: [value]` lines. Lines
/// with a blank key are skipped. A later duplicate key wins.
pub fn parse_device_properties(text: &str) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    for line in text.lines() {
        let parsed = parse_getprop_line(line).or_else(|| parse_assignment_line(line));
        if let Some((key, value)) = parsed {
            props.insert(key, value);
        }
    }
    props
}

fn parse_getprop_line(line: &str) -> Option<(String, String)> {
    let rest = line.trim().strip_prefix('[')?;
    let (key, value) = rest.split_once("]:")?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), strip_brackets(value)))
}

fn parse_assignment_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), strip_brackets(value)))
}

fn strip_brackets(value: &str) -> String {
    value.trim().replace(['[', ']'], "")
}

/// Identity of the acquired device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub model: String,
    pub serial: String,
    pub android_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
}

impl DeviceProfile {
    /// Build from parsed device properties, defaulting missing fields.
    pub fn from_properties(props: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| props.get(key).filter(|v| !v.is_empty()).cloned();
        Self {
            model: get("ro.product.model").unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
            serial: get("ro.serialno").unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
            android_version: get("ro.build.version.release")
                .unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
            manufacturer: get("ro.product.manufacturer"),
            build_id: get("ro.build.id"),
        }
    }

    /// Evidence description for the acquisition.
    pub fn description(&self) -> String {
        format!(
            "Android device acquisition: {} (Serial: {}, Android {})",
            self.model, self.serial, self.android_version
        )
    }
}

/// Case note body summarizing an acquisition log.
pub fn acquisition_log_summary(log: &str) -> String {
    let head: String = log.chars().take(LOG_SUMMARY_CHARS).collect();
    let truncated = log.chars().nth(LOG_SUMMARY_CHARS).is_some();
    let mut summary = format!("{LOG_SUMMARY_HEADING}\n\n{head}");
    if truncated {
        summary.push_str(LOG_TRUNCATED_NOTICE);
    }
    summary
}

/// Human-facing evidence number for an item recorded at `at`.
pub fn evidence_number(at: Timestamp) -> String {
    format!("EVD-{}", at.epoch_millis())
}

/// The custody log written when evidence is first recorded.
pub fn intake_custody_log(collected_by: UserId, collected_at: Timestamp) -> Vec<CustodyEvent> {
    vec![CustodyEvent::collection(collected_by, collected_at)]
}

/// What an operator supplies to record a new evidence item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceIntake {
    pub case_id: CaseId,
    pub evidence_type: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceProfile>,
}

impl EvidenceIntake {
    /// Intake of an Android device acquisition.
    pub fn device_acquisition(case_id: CaseId, device: DeviceProfile) -> Self {
        Self {
            case_id,
            evidence_type: MOBILE_DEVICE_TYPE.to_string(),
            description: device.description(),
            device: Some(device),
        }
    }

    /// Type and description must be non-blank.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.evidence_type.trim().is_empty() {
            return Err(LedgerError::Validation("evidence type is required".into()));
        }
        if self.description.trim().is_empty() {
            return Err(LedgerError::Validation("evidence description is required".into()));
        }
        Ok(())
    }

    /// The record to create for an item collected by `collected_by` at
    /// `collected_at`.
    pub fn into_record(self, collected_by: UserId, collected_at: Timestamp) -> NewEvidence {
        let custody_log = intake_custody_log(collected_by.clone(), collected_at)
            .iter()
            .map(StoredEntry::from)
            .collect();
        NewEvidence {
            case_id: self.case_id,
            evidence_number: evidence_number(collected_at),
            evidence_type: self.evidence_type,
            description: self.description,
            collected_by,
            collected_at,
            device: self.device,
            custody_log,
        }
    }
}

/// A newly recorded evidence item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredEvidence {
    pub evidence_id: EvidenceId,
    pub case_id: CaseId,
    pub evidence_number: String,
    /// The collection entry the custody log starts with.
    pub collection: CustodyEvent,
}
