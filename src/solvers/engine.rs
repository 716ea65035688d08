//! Solver Engine
//!
//! [`SolverEngine`] owns the current [`SolverRun`] and hosts its search on a Tokio
//! blocking worker. Every event the worker produces reaches the caller through the
//! [`ResultChannel`] returned alongside the engine, tagged with its run.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use tokio::{runtime::Handle, sync::mpsc};
use tracing::{error, info, info_span, warn};

use crate::{
    combinations::multiset_count,
    config::SolverConfig,
    events::{RunEvent, RunId},
    predicate::{FloorAverage, TargetPredicate},
    request::{RequestLimits, SolveRequest, SolveRequestMessage},
    solvers::{
        EngineFault, SolverError,
        run::{RunProgress, RunStatus, SolverRun, WorkerLink},
        search::{SearchOutcome, SearchSettings, search},
    },
};

/// Receiving end of the engine's events.
#[derive(Debug)]
pub struct ResultChannel {
    receiver: mpsc::UnboundedReceiver<RunEvent>,
}

impl ResultChannel {
    /// Wait for the next event.
    ///
    /// Returns `None` once the engine and every worker it started are gone.
    pub async fn recv(&mut self) -> Option<RunEvent> {
        self.receiver.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<RunEvent> {
        self.receiver.try_recv().ok()
    }

    /// Block the current thread until the next event arrives.
    ///
    /// Must not be called from within an asynchronous context.
    pub fn blocking_recv(&mut self) -> Option<RunEvent> {
        self.receiver.blocking_recv()
    }

    /// Stop receiving; workers observe this as a closed channel and stop.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

/// Runs one search at a time and streams its results.
#[derive(Debug)]
pub struct SolverEngine<P = FloorAverage> {
    predicate: Arc<P>,
    limits: RequestLimits,
    settings: SearchSettings,
    runtime: Handle,
    events: mpsc::UnboundedSender<RunEvent>,
    last_run: RunId,
    current: Option<SolverRun>,
}

impl SolverEngine<FloorAverage> {
    /// Create an engine matching on the floor of the average rating.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::NoRuntime`] outside a Tokio runtime and
    /// [`SolverError::InvalidConfig`] for an invalid rating domain.
    pub fn new(config: &SolverConfig) -> Result<(Self, ResultChannel), SolverError> {
        Self::with_predicate(config, FloorAverage)
    }
}

impl<P: TargetPredicate + 'static> SolverEngine<P> {
    /// Create an engine with a custom target predicate.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::NoRuntime`] outside a Tokio runtime and
    /// [`SolverError::InvalidConfig`] for an invalid rating domain.
    pub fn with_predicate(
        config: &SolverConfig,
        predicate: P,
    ) -> Result<(Self, ResultChannel), SolverError> {
        let runtime = Handle::try_current().map_err(|_err| SolverError::NoRuntime)?;
        let limits = config.limits()?;
        let (sender, receiver) = mpsc::unbounded_channel();

        let engine = Self {
            predicate: Arc::new(predicate),
            limits,
            settings: config.search_settings(),
            runtime,
            events: sender,
            last_run: RunId::default(),
            current: None,
        };

        Ok((engine, ResultChannel { receiver }))
    }

    /// Bounds incoming requests are validated against.
    pub fn limits(&self) -> &RequestLimits {
        &self.limits
    }

    /// Validate a request message and start a run for it.
    ///
    /// An invalid request leaves any active run untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidRequest`] if the message fails validation.
    pub fn start(&mut self, message: &SolveRequestMessage) -> Result<RunId, SolverError> {
        let request = message.validate(&self.limits)?;

        Ok(self.start_request(request))
    }

    /// Start a run for an already validated request, cancelling the active one.
    pub fn start_request(&mut self, request: SolveRequest) -> RunId {
        if let Some(previous) = self.current.take()
            && previous.cancel()
        {
            info!(run = %previous.id(), "superseding active solver run");
        }

        let id = self.last_run.next();
        self.last_run = id;

        let total = multiset_count(request.candidates().len(), request.slot_count());
        let (run, link) = SolverRun::launch(id, total, self.events.clone());

        info!(
            run = %id,
            slots = request.slot_count(),
            candidates = request.candidates().len(),
            target = %request.target(),
            total = ?total,
            "starting solver run"
        );

        let predicate = Arc::clone(&self.predicate);
        let settings = self.settings;
        let span = info_span!("solver_run", run = %id);

        drop(self.runtime.spawn_blocking(move || {
            span.in_scope(|| work(&request, predicate.as_ref(), settings, link));
        }));

        self.current = Some(run);

        id
    }

    /// Cancel the active run, if any.
    ///
    /// The request shows up at once in [`RunProgress::cancel_requested`]; the status moves
    /// from `Running` to `Cancelled` when the worker reaches its next boundary. Returns
    /// `false` when there was nothing left to cancel.
    pub fn cancel(&self) -> bool {
        self.current.as_ref().is_some_and(SolverRun::cancel)
    }
}

impl<P> SolverEngine<P> {
    /// The most recently started run.
    pub fn current_run(&self) -> Option<&SolverRun> {
        self.current.as_ref()
    }

    /// Lifecycle state of the most recent run; `Idle` before the first one.
    pub fn status(&self) -> RunStatus {
        self.current
            .as_ref()
            .map_or(RunStatus::Idle, SolverRun::status)
    }

    /// Progress of the most recent run.
    pub fn progress(&self) -> RunProgress {
        self.current
            .as_ref()
            .map(SolverRun::progress)
            .unwrap_or_default()
    }
}

impl<P> Drop for SolverEngine<P> {
    fn drop(&mut self) {
        if let Some(run) = &self.current {
            run.cancel();
        }
    }
}

fn work<P>(request: &SolveRequest, predicate: &P, settings: SearchSettings, mut link: WorkerLink)
where
    P: TargetPredicate + ?Sized,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        search(request, predicate, settings, &mut link)
    }));

    let fault = match result {
        Ok(Ok(summary)) => {
            let status = match summary.outcome {
                SearchOutcome::Exhausted => RunStatus::Done,
                SearchOutcome::Cancelled => {
                    warn!(scanned = summary.scanned, "solver run cancelled");

                    RunStatus::Cancelled
                }
                SearchOutcome::Disconnected => {
                    warn!(run = %link.run(), "event channel closed, stopping solver run");

                    RunStatus::Cancelled
                }
            };

            info!(
                scanned = summary.scanned,
                matched = summary.matched,
                events = summary.events,
                %status,
                "solver run finished"
            );

            link.settle(status, summary.scanned, summary.matched);

            return;
        }
        Ok(Err(fault)) => fault,
        Err(payload) => EngineFault::WorkerPanicked(panic_message(payload.as_ref())),
    };

    error!(%fault, "solver run failed");

    link.fail(&fault);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;

    use crate::{
        events::SolverEvent,
        predicate::PredicateError,
        ratings::{Rating, RatingCombination, ratings},
        request::RequestError,
    };

    use super::*;

    #[derive(Debug)]
    struct PanickingPredicate;

    impl TargetPredicate for PanickingPredicate {
        #[expect(clippy::panic, reason = "exercises the worker panic boundary")]
        fn is_match(
            &self,
            _existing: &[Rating],
            _candidate: &[Rating],
            _target: Rating,
        ) -> Result<bool, PredicateError> {
            panic!("predicate exploded");
        }
    }

    fn message(existing: &[i64], to_try: &[i64], target: i64) -> SolveRequestMessage {
        SolveRequestMessage {
            existing_ratings: existing.to_vec(),
            ratings_to_try: to_try.to_vec(),
            target_rating: Some(target),
        }
    }

    async fn next(channel: &mut ResultChannel) -> TestResult<RunEvent> {
        let event = tokio::time::timeout(Duration::from_secs(10), channel.recv())
            .await?
            .ok_or("event channel closed")?;

        Ok(event)
    }

    #[test]
    fn engine_requires_a_runtime() {
        assert!(matches!(
            SolverEngine::new(&SolverConfig::default()),
            Err(SolverError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn invalid_domain_is_a_config_error() {
        let config = SolverConfig {
            min_rating: 0,
            ..SolverConfig::default()
        };

        assert!(matches!(
            SolverEngine::new(&config),
            Err(SolverError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn engine_starts_idle() -> TestResult {
        let (engine, _channel) = SolverEngine::new(&SolverConfig::default())?;

        assert_eq!(engine.status(), RunStatus::Idle);
        assert!(engine.current_run().is_none());
        assert!(!engine.cancel());
        assert_eq!(engine.progress(), RunProgress::default());

        Ok(())
    }

    #[tokio::test]
    async fn invalid_request_starts_no_run() -> TestResult {
        let (mut engine, _channel) = SolverEngine::new(&SolverConfig::default())?;

        let result = engine.start(&message(&[80], &[], 80));

        assert!(matches!(
            result,
            Err(SolverError::InvalidRequest(RequestError::EmptyCandidates))
        ));
        assert_eq!(engine.status(), RunStatus::Idle);

        Ok(())
    }

    #[tokio::test]
    async fn run_streams_the_scenario_result() -> TestResult {
        let (mut engine, mut channel) = SolverEngine::new(&SolverConfig::default())?;

        let run = engine.start(&message(&[80, 82], &[75, 85], 80))?;
        let event = next(&mut channel).await?;

        assert_eq!(event.run_id, run);
        assert_eq!(
            event.event,
            SolverEvent::Done {
                result_chunk: vec![RatingCombination::new(ratings(&[75, 85])?)],
                cancelled: false,
            }
        );

        let progress = engine.current_run().ok_or("no run")?.finished().await;
        assert_eq!(progress.status, RunStatus::Done);
        assert_eq!(progress.scanned, 3);
        assert_eq!(progress.matched, 1);
        assert_eq!(progress.total, Some(3));
        assert!(!engine.cancel());

        Ok(())
    }

    #[tokio::test]
    async fn run_ids_increase_per_start() -> TestResult {
        let (mut engine, _channel) = SolverEngine::new(&SolverConfig::default())?;

        let first = engine.start(&message(&[], &[85], 85))?;
        let second = engine.start(&message(&[], &[85], 85))?;

        assert!(second > first);
        assert_eq!(engine.current_run().map(SolverRun::id), Some(second));

        Ok(())
    }

    #[tokio::test]
    async fn worker_panics_become_error_events() -> TestResult {
        let (mut engine, mut channel) =
            SolverEngine::with_predicate(&SolverConfig::default(), PanickingPredicate)?;

        let run = engine.start(&message(&[80], &[85], 85))?;
        let event = next(&mut channel).await?;

        assert_eq!(event.run_id, run);
        assert!(matches!(
            event.event,
            SolverEvent::Error { ref message } if message.contains("predicate exploded")
        ));
        assert_eq!(
            engine.current_run().ok_or("no run")?.finished().await.status,
            RunStatus::Failed
        );

        Ok(())
    }
}
