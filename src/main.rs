//! Squad Solver CLI
//!
//! Loads a scenario from a fixture or from flags, runs the solver and prints the
//! solutions cheapest first. Ctrl+C or `--timeout-secs` stop the search early and
//! print what was found so far.

use std::{io, process, time::Instant};

use thiserror::Error;
use tokio::signal;
use tracing::{error, info, warn};

use squad_solver::{
    config::Cli,
    fixtures::FixtureError,
    observability::init_subscriber,
    report::{ReportError, write_outcome, write_solutions},
    solutions::session::{SessionError, SolverSession},
    solvers::SolverError,
};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to listen for Ctrl+C: {0}")]
    Signal(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    let cli = Cli::load().unwrap_or_else(|err| err.exit());

    if let Err(err) = init_subscriber(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln for setup errors"
        )]
        {
            eprintln!("Logging error: {err}");
        }

        process::exit(1);
    }

    if let Err(err) = run(&cli).await {
        error!(%err, "squad solver failed");

        process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let scenario = cli.scenario.scenario()?;

    info!(
        scenario = %scenario.name,
        description = scenario.description.as_deref().unwrap_or_default(),
        priced = scenario.prices.len(),
        "loaded scenario"
    );

    let limits = cli.solver.limits().map_err(SolverError::from)?;
    let request = scenario.request.validate(&limits).map_err(SolverError::from)?;

    let mut session = SolverSession::new(&cli.solver, scenario.prices.clone())?;

    let started = Instant::now();
    session.start_request(request.clone());

    let finished = tokio::select! {
        outcome = session.run_to_completion(cli.timeout()) => Some(outcome?),
        interrupted = signal::ctrl_c() => {
            interrupted?;

            None
        }
    };

    let outcome = if let Some(outcome) = finished {
        outcome
    } else {
        warn!("interrupted, stopping solver run");

        session.stop();
        session.run_to_completion(None).await?
    };

    let elapsed = started.elapsed();
    let progress = session.progress();

    info!(
        scanned = progress.scanned,
        matched = progress.matched,
        total = ?progress.total,
        "search statistics"
    );

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    write_solutions(
        &mut handle,
        session.solutions(),
        request.existing(),
        request.slot_count(),
        cli.limit,
    )?;

    write_outcome(&mut handle, &outcome, elapsed)?;

    Ok(())
}
