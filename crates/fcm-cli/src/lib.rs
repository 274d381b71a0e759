//! # fcm-cli: Chain-of-Custody Command-Line Tool
//!
//! ## Subcommands
//!
//! - `fcm timeline`: Print the resolved custody timeline of an evidence item.
//! - `fcm append`: Record a custody entry as the signed-in user.
//! - `fcm classify`: Show the presentation class of an action label.
//! - `fcm actions`: List the actions offered when recording an entry.
//! - `fcm inspect`: Check an acquisition output directory before intake;
//!   `--register --case <id>` records it as new evidence.
//!
//! `--json` switches any subcommand to machine-readable output.
//!
//! ```bash
//! fcm timeline 6f1c2b9e-3a57-4d1e-9c0a-1b2c3d4e5f60 --newest-first
//! fcm append 6f1c2b9e-3a57-4d1e-9c0a-1b2c3d4e5f60 --action "Hash Verified" --hash-file image.dd
//! ```

pub mod custody;
pub mod inspect;

use std::io::Write;

/// Write `value` as pretty JSON followed by a newline.
pub fn write_json<W: Write, T: serde::Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
