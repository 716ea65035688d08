//! Solvers

use thiserror::Error;

use crate::{events::RunId, predicate::PredicateError, ratings::RatingError, request::RequestError};

pub mod engine;
pub mod run;
pub mod search;

/// Solver Errors
#[derive(Debug, Error)]
pub enum SolverError {
    /// The request was rejected before any search started.
    #[error(transparent)]
    InvalidRequest(#[from] RequestError),

    /// A run was aborted by an internal fault.
    #[error(transparent)]
    Fault(#[from] EngineFault),

    /// The solver configuration describes an invalid rating domain.
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(#[from] RatingError),

    /// Runs need a Tokio runtime to host their worker.
    #[error("no Tokio runtime is available to host the solver worker")]
    NoRuntime,
}

/// Internal failure that aborts a run with a terminal `ERROR` event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineFault {
    /// Wrapped predicate evaluation error.
    #[error(transparent)]
    Predicate(#[from] PredicateError),

    /// The worker panicked.
    #[error("solver worker panicked: {0}")]
    WorkerPanicked(String),
}

/// The caller stopped receiving events for a run.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("event channel for {run} is closed")]
pub struct ChannelFault {
    /// Run whose event could not be delivered
    pub run: RunId,
}
