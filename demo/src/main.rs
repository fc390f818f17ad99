//! attesta: Accountability Protocol Demo CLI
//!
//! Runs one or all of the protocol demo scenarios end to end with freshly
//! generated Ed25519 keys.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- graph
//!   cargo run -p demo -- federation [--policy policies/federation.toml]
//!   cargo run -p demo -- execution

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use attesta_contracts::error::AttestaResult;
use attesta_policy::TrustPolicy;

mod scenarios;

use scenarios::{execution, federation, graph};

// ── CLI definition ────────────────────────────────────────────────────────────

/// attesta: verifiable accountability protocol demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "attesta accountability protocol demo",
    long_about = "Runs attesta demo scenarios showing hash-chained accountability graphs,\n\
                  federated aggregation with trust policies, and replay-guarded execution."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all scenarios in sequence.
    RunAll,
    /// Scenario 1: node references, edges and chain links.
    Graph,
    /// Scenario 2: federated aggregation, trust policy, acceptance receipt.
    Federation {
        /// Trust policy TOML file; defaults to the bundled policy.
        #[arg(long)]
        policy: Option<PathBuf>,
    },
    /// Scenario 3: contract verification, replay guard, revocation.
    Execution,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::Graph => graph::run_scenario(),
        Command::Federation { policy } => run_federation(policy),
        Command::Execution => execution::run_scenario(),
    };

    match result {
        Ok(()) => println!("All selected scenarios completed."),
        Err(e) => {
            eprintln!("Demo error: {e}");
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> AttestaResult<()> {
    graph::run_scenario()?;
    run_federation(None)?;
    execution::run_scenario()
}

fn run_federation(policy_path: Option<PathBuf>) -> AttestaResult<()> {
    let policy = match policy_path {
        Some(path) => TrustPolicy::from_file(&path)?,
        None => TrustPolicy::from_toml_str(federation::FEDERATION_POLICY)?,
    };
    federation::run_scenario(&policy)
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("attesta: Verifiable Accountability Protocol");
    println!("===========================================");
    println!();
    println!("Every record is canonicalized, SHA-256 hashed and Ed25519 signed:");
    println!("  [1] Graph:       node refs and edges bind objects by content hash");
    println!("  [2] Chain:       each link carries the hash of its predecessor");
    println!("  [3] Aggregates:  heads roll up into signed, federated summaries");
    println!("  [4] Policy:      trust decisions are hashed into signed receipts");
    println!("  [5] Execution:   contracts run at most once, only when verified");
    println!();
}
