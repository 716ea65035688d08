//! Solver Events
//!
//! Events a run sends back to its caller. Every event is tagged with the [`RunId`] of
//! the run that produced it so callers can drop events from superseded runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ratings::RatingCombination;

/// Identifier of a single solver run, unique per engine.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    /// Create a run identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric value of the identifier.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The identifier that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Payload of an event emitted by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverEvent {
    /// A full chunk of accepted combinations; more events follow.
    InProgress {
        /// Accepted combinations, in enumeration order
        #[serde(rename = "resultChunk")]
        result_chunk: Vec<RatingCombination>,
    },

    /// Terminal event carrying whatever was still buffered (possibly nothing).
    Done {
        /// Remaining accepted combinations, in enumeration order
        #[serde(rename = "resultChunk")]
        result_chunk: Vec<RatingCombination>,

        /// Whether the run stopped early because it was cancelled
        #[serde(default)]
        cancelled: bool,
    },

    /// Terminal event for a run aborted by an internal fault.
    Error {
        /// Diagnostic message
        message: String,
    },
}

impl SolverEvent {
    /// Whether no further events follow this one for the same run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SolverEvent::InProgress { .. })
    }

    /// Combinations carried by the event; empty for errors.
    pub fn chunk(&self) -> &[RatingCombination] {
        match self {
            SolverEvent::InProgress { result_chunk } | SolverEvent::Done { result_chunk, .. } => {
                result_chunk
            }
            SolverEvent::Error { .. } => &[],
        }
    }
}

/// An event together with the run that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvent {
    /// Run that produced the event
    pub run_id: RunId,

    /// Event payload
    #[serde(flatten)]
    pub event: SolverEvent,
}

impl RunEvent {
    /// Tag an event with its run.
    pub fn new(run_id: RunId, event: SolverEvent) -> Self {
        Self { run_id, event }
    }

    /// Encode the event as a JSON message.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if encoding fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode an event from a JSON message.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the message is not a valid event.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
