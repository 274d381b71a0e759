//! # Custody Subcommands
//!
//! `timeline`, `append`, `classify` and `actions`. The first two go through
//! a [`CustodyLedger`]; the caller decides which store backs it.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fcm_core::EvidenceId;
use fcm_custody::{
    classify_action, ActorProvider, CustodyAction, CustodyEvent, CustodyLedger, EntryDetails,
    Timeline, TimelineEntry,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::write_json;

/// Arguments for `fcm timeline`.
#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Evidence UUID.
    #[arg(value_name = "EVIDENCE_ID")]
    pub evidence_id: String,
    /// Print the most recent entry first.
    #[arg(long)]
    pub newest_first: bool,
}

/// Arguments for `fcm append`.
#[derive(Args, Debug)]
pub struct AppendArgs {
    /// Evidence UUID.
    #[arg(value_name = "EVIDENCE_ID")]
    pub evidence_id: String,
    /// Action label, e.g. "Evidence Transferred" or "Custom Action".
    #[arg(long)]
    pub action: String,
    /// Label to record when the action is "Custom Action".
    #[arg(long)]
    pub custom_label: Option<String>,
    /// Where the action took place.
    #[arg(long)]
    pub location: Option<String>,
    /// Free-text remarks.
    #[arg(long)]
    pub notes: Option<String>,
    /// Hash value to record.
    #[arg(long, value_name = "HEX", conflicts_with = "hash_file")]
    pub hash: Option<String>,
    /// Record the SHA-256 of this file.
    #[arg(long, value_name = "FILE")]
    pub hash_file: Option<PathBuf>,
}

/// Arguments for `fcm classify`.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Action label to classify.
    #[arg(value_name = "ACTION")]
    pub action: String,
}

/// Timeline in the requested display order.
#[derive(Serialize)]
struct TimelineView<'a> {
    evidence_id: EvidenceId,
    synthetic_seed: bool,
    entries: Vec<&'a TimelineEntry>,
}

/// Print the resolved custody timeline.
pub async fn run_timeline<W: Write>(
    ledger: &CustodyLedger,
    args: &TimelineArgs,
    json: bool,
    out: &mut W,
) -> Result<u8> {
    let evidence_id: EvidenceId = args.evidence_id.parse()?;
    let timeline = ledger
        .read_timeline(&evidence_id)
        .await
        .with_context(|| format!("reading custody timeline of {evidence_id}"))?;

    let entries: Vec<&TimelineEntry> = if args.newest_first {
        timeline.newest_first()
    } else {
        timeline.entries.iter().collect()
    };

    if json {
        write_json(
            out,
            &TimelineView {
                evidence_id,
                synthetic_seed: timeline.synthetic_seed,
                entries,
            },
        )?;
    } else {
        write_timeline_text(out, &timeline, &entries)?;
    }
    Ok(0)
}

fn write_timeline_text<W: Write>(
    out: &mut W,
    timeline: &Timeline,
    entries: &[&TimelineEntry],
) -> io::Result<()> {
    let noun = if timeline.len() == 1 { "entry" } else { "entries" };
    write!(out, "Evidence {} ({} {noun}", timeline.evidence_id, timeline.len())?;
    if timeline.synthetic_seed {
        write!(out, ", derived from collection record")?;
    }
    writeln!(out, ")")?;

    for entry in entries {
        let class = entry.classification();
        writeln!(
            out,
            "{}  {}  {} ({})  [{}]",
            entry.display_time(),
            entry.event.action,
            entry.actor.display_name,
            entry.actor.initials(),
            class.category.as_str(),
        )?;
        if let Some(location) = &entry.event.location {
            writeln!(out, "    location: {location}")?;
        }
        if let Some(notes) = &entry.event.notes {
            writeln!(out, "    notes: {notes}")?;
        }
        if let Some(preview) = entry.hash_preview() {
            writeln!(out, "    hash: {preview}")?;
        }
    }
    Ok(())
}

/// Record a custody entry as the user reported by `actors`.
pub async fn run_append<W: Write>(
    ledger: &CustodyLedger,
    actors: &dyn ActorProvider,
    args: &AppendArgs,
    json: bool,
    out: &mut W,
) -> Result<u8> {
    let evidence_id: EvidenceId = args.evidence_id.parse()?;
    let hash_verification = match &args.hash_file {
        Some(path) => Some(sha256_file(path)?),
        None => args.hash.clone(),
    };
    let action = CustodyAction::from_selection(&args.action, args.custom_label.as_deref());
    let details = EntryDetails {
        location: args.location.clone(),
        notes: args.notes.clone(),
        hash_verification,
    };

    let event = ledger
        .append_as_current(actors, &evidence_id, action, details)
        .await
        .with_context(|| format!("recording custody entry on {evidence_id}"))?;

    if json {
        write_json(out, &event)?;
    } else {
        write_recorded(out, &evidence_id, &event)?;
    }
    Ok(0)
}

fn write_recorded<W: Write>(out: &mut W, evidence_id: &EvidenceId, event: &CustodyEvent) -> io::Result<()> {
    writeln!(
        out,
        "OK: recorded \"{}\" on evidence {} at {}",
        event.action,
        evidence_id,
        event.timestamp.to_iso8601()
    )?;
    if let Some(hash) = &event.hash_verification {
        writeln!(out, "    hash: {hash}")?;
    }
    Ok(())
}

/// Print the presentation class of an action label.
pub fn run_classify<W: Write>(args: &ClassifyArgs, json: bool, out: &mut W) -> Result<u8> {
    let class = classify_action(&args.action);
    if json {
        write_json(out, &class)?;
    } else {
        writeln!(
            out,
            "category={} icon={} color={}",
            class.category.as_str(),
            class.icon.as_str(),
            class.color.as_str()
        )?;
    }
    Ok(0)
}

/// List the actions offered when recording an entry.
pub fn run_actions<W: Write>(json: bool, out: &mut W) -> Result<u8> {
    let labels = CustodyAction::selectable_labels();
    if json {
        write_json(out, &labels)?;
    } else {
        for label in labels {
            writeln!(out, "{label}")?;
        }
    }
    Ok(0)
}

/// Lowercase hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}
