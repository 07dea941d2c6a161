//! Cascade Run - executes the derivation cascade and exports a snapshot
//!
//! Seeds the store with established constants, runs the registered
//! units in dependency order, certifies the result, and writes the
//! export snapshot.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cascade_engine::{Engine, RunOptions, UnitOutcome};
use cascade_registry::ParameterStore;
use cascade_snapshot::Snapshot;

mod checks;
mod seed;
mod units;

#[derive(Parser, Debug)]
#[command(name = "cascade-run")]
#[command(about = "Run the derivation cascade and export a snapshot")]
struct Cli {
    /// Path to a JSON seed of established constants (built-in values if omitted)
    seed: Option<PathBuf>,

    /// Where to write the export snapshot
    #[arg(short, long, default_value = "snapshot.json")]
    output: PathBuf,

    /// Comma-separated unit ids to exclude from this run
    #[arg(long, default_value = "")]
    skip: String,

    /// Per-unit time budget in milliseconds
    #[arg(long)]
    budget_ms: Option<u64>,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cascade=info,cascade_run=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut store = ParameterStore::new();
    match &cli.seed {
        Some(path) => {
            info!(path = %path.display(), "loading seed file");
            if let Err(e) = seed::load_file(&mut store, path) {
                error!("failed to load seed: {e}");
                process::exit(1);
            }
        }
        None => seed::load_default(&mut store),
    }

    let mut engine = Engine::new();
    if let Err(e) = units::register_all(&mut engine) {
        error!("failed to register units: {e}");
        process::exit(1);
    }

    let options = RunOptions {
        skip: cli
            .skip
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        time_budget: cli.budget_ms.map(Duration::from_millis),
    };

    let report = match engine.run_with_options(&mut store, options) {
        Ok(report) => report,
        Err(e) => {
            error!("run aborted before execution: {e}");
            process::exit(1);
        }
    };

    if !report.all_succeeded() {
        warn!(
            failed = report.count(UnitOutcome::Failed),
            blocked = report.count(UnitOutcome::Blocked),
            skipped = report.count(UnitOutcome::Skipped),
            "run completed with non-success outcomes; snapshot will be partial"
        );
    }

    let verification = checks::verifier().verify(&store);
    info!(
        verified = verification.verified,
        checks = verification.checks.len(),
        gates = verification.gates.len(),
        "verification complete"
    );
    for check in verification.failed() {
        warn!(id = %check.id, message = %check.message, "certificate did not pass");
    }

    let snapshot = Snapshot::export(&store, &verification);
    if let Err(e) = snapshot.write(&cli.output) {
        error!("failed to write snapshot: {e}");
        process::exit(1);
    }

    info!(
        path = %cli.output.display(),
        params = snapshot.params.len(),
        "snapshot written"
    );
}
