//! Solver Session
//!
//! A [`SolverSession`] is the caller side of the engine: it starts runs, drops events
//! that belong to superseded runs and turns accepted combinations into priced
//! [`Solution`](super::Solution)s.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::{
    config::SolverConfig,
    events::{RunEvent, RunId, SolverEvent},
    predicate::{FloorAverage, TargetPredicate},
    prices::{PriceTable, PriceTableError},
    request::{SolveRequest, SolveRequestMessage},
    solutions::SolutionSet,
    solvers::{
        SolverError,
        engine::{ResultChannel, SolverEngine},
        run::{RunProgress, RunStatus},
    },
};

/// Session Errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Wrapped solver error.
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// A solution could not be priced.
    #[error(transparent)]
    Prices(#[from] PriceTableError),

    /// There is no run to wait for.
    #[error("no solver run is active")]
    NotRunning,

    /// The event channel closed while a run was active.
    #[error("event channel closed while {0} was active")]
    Disconnected(RunId),
}

/// Final state of a run as seen by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Run the outcome belongs to
    pub run: RunId,

    /// Terminal status
    pub status: RunStatus,

    /// Number of solutions collected
    pub solutions: usize,

    /// Fault message, for failed runs
    pub message: Option<String>,
}

/// Effect of applying one event to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The event belonged to a superseded or stopped run and was dropped.
    Stale(RunId),

    /// A chunk of solutions was added to the active run.
    Progress {
        /// Active run
        run: RunId,
        /// Solutions added by the chunk
        added: usize,
    },

    /// The active run reached its terminal event.
    Finished(RunOutcome),
}

/// Caller-side view of a solver engine and the solutions of its latest run.
#[derive(Debug)]
pub struct SolverSession<'a, P = FloorAverage> {
    engine: SolverEngine<P>,
    channel: ResultChannel,
    prices: PriceTable<'a>,
    solutions: SolutionSet<'a>,
    run: Option<RunId>,
    status: RunStatus,
    message: Option<String>,
}

impl<'a> SolverSession<'a, FloorAverage> {
    /// Create a session with a fresh engine.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError::Solver`] if the engine cannot be created.
    pub fn new(config: &SolverConfig, prices: PriceTable<'a>) -> Result<Self, SessionError> {
        let (engine, channel) = SolverEngine::new(config)?;

        Ok(Self::with_engine(engine, channel, prices))
    }
}

impl<'a, P: TargetPredicate + 'static> SolverSession<'a, P> {
    /// Create a session around an existing engine and its channel.
    pub fn with_engine(
        engine: SolverEngine<P>,
        channel: ResultChannel,
        prices: PriceTable<'a>,
    ) -> Self {
        Self {
            engine,
            channel,
            prices,
            solutions: SolutionSet::new(),
            run: None,
            status: RunStatus::Idle,
            message: None,
        }
    }

    /// Start a run, discarding the solutions of the previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError::Solver`] if the request is invalid; the previous run and
    /// its solutions are left untouched in that case.
    pub fn start(&mut self, message: &SolveRequestMessage) -> Result<RunId, SessionError> {
        let request = message
            .validate(self.engine.limits())
            .map_err(SolverError::from)?;

        Ok(self.start_request(request))
    }

    /// Start a run for an already validated request.
    pub fn start_request(&mut self, request: SolveRequest) -> RunId {
        let run = self.engine.start_request(request);

        self.solutions.clear();
        self.run = Some(run);
        self.status = RunStatus::Running;
        self.message = None;

        run
    }

    /// Stop the active run, keeping the solutions collected so far.
    ///
    /// Returns `false` when no run was active.
    pub fn stop(&mut self) -> bool {
        if self.status != RunStatus::Running {
            return false;
        }

        self.engine.cancel();
        self.status = RunStatus::Cancelled;

        true
    }

    /// Apply one event from the engine.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError::Prices`] if a solution cannot be priced.
    pub fn apply(&mut self, event: RunEvent) -> Result<SessionUpdate, SessionError> {
        let RunEvent { run_id, event } = event;

        if self.run != Some(run_id) || self.status != RunStatus::Running {
            debug!(run = %run_id, "dropping stale event");

            return Ok(SessionUpdate::Stale(run_id));
        }

        let added = event.chunk().len();

        for combination in event.chunk() {
            let price = self.prices.price_of(combination)?;

            self.solutions.push(combination.clone(), price);
        }

        match event {
            SolverEvent::InProgress { .. } => Ok(SessionUpdate::Progress { run: run_id, added }),
            SolverEvent::Done { cancelled, .. } => {
                self.status = if cancelled {
                    RunStatus::Cancelled
                } else {
                    RunStatus::Done
                };

                Ok(SessionUpdate::Finished(self.outcome(run_id)))
            }
            SolverEvent::Error { message } => {
                warn!(run = %run_id, %message, "solver run failed");

                self.status = RunStatus::Failed;
                self.message = Some(message);

                Ok(SessionUpdate::Finished(self.outcome(run_id)))
            }
        }
    }

    /// Wait for the next event and apply it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Disconnected`] if the channel closes and any error from
    /// [`SolverSession::apply`].
    pub async fn next_update(&mut self) -> Result<SessionUpdate, SessionError> {
        let event = self
            .channel
            .recv()
            .await
            .ok_or_else(|| SessionError::Disconnected(self.run.unwrap_or_default()))?;

        self.apply(event)
    }

    /// Apply events until the active run finishes, stopping it once `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotRunning`] when no run is active and any error from
    /// [`SolverSession::next_update`].
    pub async fn run_to_completion(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<RunOutcome, SessionError> {
        let run = self.run.ok_or(SessionError::NotRunning)?;

        if self.status != RunStatus::Running {
            return Ok(self.outcome(run));
        }

        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        loop {
            let update = match deadline {
                Some(deadline) => {
                    if let Ok(update) = time::timeout_at(deadline, self.next_update()).await {
                        update?
                    } else {
                        warn!(run = %run, "solver run timed out, stopping it");

                        self.stop();

                        return Ok(self.outcome(run));
                    }
                }
                None => self.next_update().await?,
            };

            if let SessionUpdate::Finished(outcome) = update {
                return Ok(outcome);
            }
        }
    }

    fn outcome(&self, run: RunId) -> RunOutcome {
        RunOutcome {
            run,
            status: self.status,
            solutions: self.solutions.len(),
            message: self.message.clone(),
        }
    }

    /// Solutions of the latest run, cheapest first.
    pub fn solutions(&self) -> &SolutionSet<'a> {
        &self.solutions
    }

    /// Prices solutions are annotated with.
    pub fn prices(&self) -> &PriceTable<'a> {
        &self.prices
    }

    /// Latest run started by the session.
    pub fn run(&self) -> Option<RunId> {
        self.run
    }

    /// Status of the latest run as observed through its events.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Whether a run is active.
    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Whether the latest run finished without finding anything.
    pub fn no_solutions(&self) -> bool {
        self.status == RunStatus::Done && self.solutions.is_empty()
    }

    /// Fault message of the latest run, if it failed.
    pub fn error_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Engine-side progress of the latest run.
    pub fn progress(&self) -> RunProgress {
        self.engine.progress()
    }

    /// The underlying engine.
    pub fn engine(&self) -> &SolverEngine<P> {
        &self.engine
    }
}
