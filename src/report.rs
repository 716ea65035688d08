//! Report
//!
//! Renders the solutions of a run as a terminal table, cheapest first.

use std::{io, time::Duration};

use humanize_duration::{Truncate, prelude::DurationExt};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    predicate::{PredicateError, floor_average},
    ratings::Rating,
    solutions::{SolutionSet, session::RunOutcome},
    solvers::run::RunStatus,
};

/// Errors that can occur when writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The resulting average of a solution could not be computed.
    #[error(transparent)]
    Predicate(#[from] PredicateError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Write up to `limit` solutions as a table followed by a summary line.
///
/// There is one column per slot, then the squad average the solution reaches and its
/// total price.
///
/// # Errors
///
/// Returns a [`ReportError`] if an average cannot be computed or the output fails.
pub fn write_solutions(
    mut out: impl io::Write,
    solutions: &SolutionSet<'_>,
    existing: &[Rating],
    slots: usize,
    limit: Option<usize>,
) -> Result<(), ReportError> {
    if solutions.is_empty() {
        return writeln!(out, "\nNo solutions found.\n").map_err(|_err| ReportError::IO);
    }

    let shown = limit.unwrap_or(usize::MAX).min(solutions.len());
    let mut builder = Builder::default();

    builder.push_record(header(slots));

    for solution in solutions.iter().take(shown) {
        let mut row: Vec<String> = Vec::with_capacity(slots + 3);

        row.push(format!("{}", solution.id() + 1));
        row.extend(solution.combination().iter().map(ToString::to_string));
        row.push(floor_average(existing, solution.combination())?.to_string());
        row.push(solution.price().to_string());

        builder.push_record(row);
    }

    let mut table = builder.build();

    table.with(Theme::from(Style::modern_rounded()));
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..), Alignment::right());

    writeln!(out, "\n{table}").map_err(|_err| ReportError::IO)?;

    writeln!(
        out,
        " Showing {shown} of {} solutions, cheapest first.",
        solutions.len()
    )
    .map_err(|_err| ReportError::IO)
}

fn header(slots: usize) -> Vec<String> {
    let mut header = Vec::with_capacity(slots + 3);

    header.push("#".to_string());
    header.extend((1..=slots).map(|slot| format!("Slot {slot}")));
    header.push("Average".to_string());
    header.push("Price".to_string());

    header
}

/// Write a one-line summary of how a run ended and how long it took.
///
/// # Errors
///
/// Returns [`ReportError::IO`] if the output fails.
pub fn write_outcome(
    mut out: impl io::Write,
    outcome: &RunOutcome,
    elapsed: Duration,
) -> Result<(), ReportError> {
    let verdict = match outcome.status {
        RunStatus::Done => "finished".to_string(),
        RunStatus::Cancelled => "stopped early".to_string(),
        RunStatus::Failed => format!(
            "failed: {}",
            outcome.message.as_deref().unwrap_or("unknown error")
        ),
        RunStatus::Idle | RunStatus::Running => outcome.status.to_string(),
    };

    writeln!(
        out,
        " {} {verdict} with {} solutions in {} ({}s)",
        outcome.run,
        outcome.solutions,
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )
    .map_err(|_err| ReportError::IO)
}
