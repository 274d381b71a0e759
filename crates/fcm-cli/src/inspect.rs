//! # Acquisition Inspection
//!
//! `fcm inspect <dir>` checks an acquisition output directory before the
//! evidence is recorded: which expected files are missing, the device
//! identity parsed from `device_properties.txt`, and the log summary note.
//!
//! With `--register --case <id>` a complete acquisition is then recorded
//! as a new `Mobile Device` evidence item collected by the signed-in user.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fcm_core::{CaseId, Timestamp};
use fcm_custody::intake::{
    acquisition_log_summary, evidence_number, missing_acquisition_files,
    parse_device_properties, DeviceProfile,
};
use fcm_custody::{ActorProvider, CustodyLedger, EvidenceIntake, RegisteredEvidence};
use serde::Serialize;

use crate::write_json;

const PROPERTIES_FILE: &str = "device_properties.txt";
const LOG_FILE: &str = "acquisition.log";

/// Arguments for `fcm inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Acquisition output directory.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Record the acquired device as new evidence when nothing is missing.
    #[arg(long, requires = "case")]
    pub register: bool,

    /// Case the registered evidence belongs to.
    #[arg(long, value_name = "CASE_ID")]
    pub case: Option<CaseId>,
}

/// Inspection followed by registration.
#[derive(Debug, Serialize)]
pub struct RegistrationReport {
    pub inspection: InspectionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered: Option<RegisteredEvidence>,
}

/// Result of inspecting one acquisition directory.
#[derive(Debug, Serialize)]
pub struct InspectionReport {
    pub directory: PathBuf,
    pub complete: bool,
    pub missing_files: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub evidence_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_summary: Option<String>,
}

/// Inspect `dir`, stamping the proposed evidence number with `now`.
pub fn inspect_directory(dir: &Path, now: Timestamp) -> Result<InspectionReport> {
    let mut present = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            present.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    let missing_files = missing_acquisition_files(present.iter().map(String::as_str));

    let device = read_optional(&dir.join(PROPERTIES_FILE))?
        .map(|text| DeviceProfile::from_properties(&parse_device_properties(&text)));
    let log_summary = read_optional(&dir.join(LOG_FILE))?.map(|log| acquisition_log_summary(&log));

    Ok(InspectionReport {
        directory: dir.to_path_buf(),
        complete: missing_files.is_empty(),
        missing_files,
        description: device.as_ref().map(DeviceProfile::description),
        device,
        evidence_number: evidence_number(now),
        log_summary,
    })
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Some(text))
}

/// Print the inspection report. Exit code 2 when files are missing.
pub fn run_inspect<W: Write>(args: &InspectArgs, json: bool, out: &mut W) -> Result<u8> {
    let report = inspect_directory(&args.dir, Timestamp::now())?;
    if json {
        write_json(out, &report)?;
    } else {
        write_report_text(out, &report)?;
    }
    if report.complete {
        Ok(0)
    } else {
        tracing::warn!(
            dir = %report.directory.display(),
            missing = report.missing_files.len(),
            "acquisition output incomplete"
        );
        Ok(2)
    }
}

/// Inspect, then register the device as evidence of `args.case` if the
/// acquisition is complete. Exit code 2 when files are missing; nothing is
/// registered then.
pub async fn run_register<W: Write>(
    ledger: &CustodyLedger,
    actors: &dyn ActorProvider,
    args: &InspectArgs,
    json: bool,
    out: &mut W,
) -> Result<u8> {
    let case_id = args.case.context("--register needs --case")?;
    let inspection = inspect_directory(&args.dir, Timestamp::now())?;

    let registered = match (&inspection.device, inspection.complete) {
        (Some(device), true) => {
            let intake = EvidenceIntake::device_acquisition(case_id, device.clone());
            let registered = ledger
                .register_as_current(actors, intake)
                .await
                .context("failed to register evidence")?;
            Some(registered)
        }
        _ => None,
    };

    let code = if registered.is_some() { 0 } else { 2 };
    if code == 2 {
        tracing::warn!(
            dir = %inspection.directory.display(),
            missing = inspection.missing_files.len(),
            "acquisition output incomplete, not registering"
        );
    }

    let report = RegistrationReport {
        inspection,
        registered,
    };
    if json {
        write_json(out, &report)?;
    } else {
        write_report_text(out, &report.inspection)?;
        if let Some(registered) = &report.registered {
            writeln!(out)?;
            writeln!(
                out,
                "Registered {} as evidence {} in case {}",
                registered.evidence_number, registered.evidence_id, registered.case_id
            )?;
        }
    }
    Ok(code)
}

fn write_report_text<W: Write>(out: &mut W, report: &InspectionReport) -> std::io::Result<()> {
    if report.complete {
        writeln!(out, "OK: all acquisition files present in {}", report.directory.display())?;
    } else {
        writeln!(out, "INCOMPLETE: {}", report.directory.display())?;
        for name in &report.missing_files {
            writeln!(out, "  missing: {name}")?;
        }
    }
    if let Some(description) = &report.description {
        writeln!(out, "{description}")?;
    }
    writeln!(out, "Evidence number: {}", report.evidence_number)?;
    if let Some(summary) = &report.log_summary {
        writeln!(out)?;
        writeln!(out, "{summary}")?;
    }
    Ok(())
}
