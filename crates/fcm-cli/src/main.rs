//! # fcm CLI Entry Point
//!
//! Parses arguments, initializes tracing, and dispatches to the subcommand
//! handlers in the library crate. Handlers return an exit code; errors are
//! logged and exit with 1.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use fcm_backend::{BackendClient, BackendConfig, BackendStore};
use fcm_cli::custody::{AppendArgs, ClassifyArgs, TimelineArgs};
use fcm_cli::inspect::InspectArgs;
use fcm_custody::CustodyLedger;
use tracing_subscriber::EnvFilter;

/// Chain-of-custody tool for forensic evidence records.
///
/// Reads and appends custody logs through the evidence backend configured
/// by FCM_BACKEND_URL, FCM_BACKEND_API_KEY and FCM_ACCESS_TOKEN.
#[derive(Parser, Debug)]
#[command(name = "fcm", version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Machine-readable JSON output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the custody timeline of an evidence item.
    Timeline(TimelineArgs),
    /// Record a custody entry as the signed-in user.
    Append(AppendArgs),
    /// Show the presentation class of an action label.
    Classify(ClassifyArgs),
    /// List the selectable custody actions.
    Actions,
    /// Check an acquisition output directory, optionally registering it.
    Inspect(InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let mut out = io::stdout().lock();
    match &cli.command {
        Commands::Classify(args) => fcm_cli::custody::run_classify(args, cli.json, &mut out),
        Commands::Actions => fcm_cli::custody::run_actions(cli.json, &mut out),
        Commands::Inspect(args) if args.register => {
            let (ledger, store) = backend_ledger()?;
            runtime()?.block_on(fcm_cli::inspect::run_register(
                &ledger, &store, args, cli.json, &mut out,
            ))
        }
        Commands::Inspect(args) => fcm_cli::inspect::run_inspect(args, cli.json, &mut out),
        Commands::Timeline(args) => {
            let (ledger, _) = backend_ledger()?;
            runtime()?.block_on(fcm_cli::custody::run_timeline(&ledger, args, cli.json, &mut out))
        }
        Commands::Append(args) => {
            let (ledger, store) = backend_ledger()?;
            runtime()?.block_on(fcm_cli::custody::run_append(
                &ledger, &store, args, cli.json, &mut out,
            ))
        }
    }
}

/// Ledger over the configured backend. The store doubles as actor provider.
fn backend_ledger() -> anyhow::Result<(CustodyLedger, BackendStore)> {
    let config = BackendConfig::from_env().context("backend is not configured")?;
    tracing::debug!(?config, "using evidence backend");
    let store = BackendStore::new(BackendClient::new(config)?);
    let ledger = CustodyLedger::new(Arc::new(store.clone()), Arc::new(store.clone()));
    Ok((ledger, store))
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}
