//! Solver Runs
//!
//! A [`SolverRun`] is the engine's handle on one execution of the search. The worker
//! executing it holds the matching [`WorkerLink`]; the two halves only share a pair of
//! `watch` channels (cancellation one way, progress the other) plus the engine's event
//! sender.

use std::{fmt, thread};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::{
    events::{RunEvent, RunId, SolverEvent},
    solvers::{ChannelFault, EngineFault, search::EventSink},
};

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// No run has been started.
    #[default]
    Idle,

    /// The worker is enumerating.
    Running,

    /// The run stopped early after a cancellation or a closed channel.
    Cancelled,

    /// Every combination was examined.
    Done,

    /// The run was aborted by an engine fault.
    Failed,
}

impl RunStatus {
    /// Whether the run can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled | RunStatus::Done | RunStatus::Failed
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Done => "done",
            RunStatus::Failed => "failed",
        };

        f.write_str(label)
    }
}

/// Snapshot of a run's progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunProgress {
    /// Run the snapshot belongs to
    pub run: RunId,

    /// Lifecycle state
    pub status: RunStatus,

    /// Combinations examined so far
    pub scanned: u64,

    /// Combinations accepted so far
    pub matched: u64,

    /// Size of the search space, if it fits in a `u128`
    pub total: Option<u128>,

    /// Whether the caller has asked the run to stop
    ///
    /// `status` follows the worker and stays `Running` until the worker reaches its next
    /// boundary; this flag is set as soon as `cancel` returns.
    pub cancel_requested: bool,
}

/// Engine-side handle on a run.
#[derive(Debug)]
pub struct SolverRun {
    id: RunId,
    cancel: watch::Sender<bool>,
    progress: watch::Receiver<RunProgress>,
}

impl SolverRun {
    /// Create a run in the `Running` state together with the worker's half.
    pub(crate) fn launch(
        id: RunId,
        total: Option<u128>,
        events: mpsc::UnboundedSender<RunEvent>,
    ) -> (Self, WorkerLink) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (progress_tx, progress_rx) = watch::channel(RunProgress {
            run: id,
            status: RunStatus::Running,
            scanned: 0,
            matched: 0,
            total,
            cancel_requested: false,
        });

        let run = Self {
            id,
            cancel: cancel_tx,
            progress: progress_rx,
        };

        let link = WorkerLink {
            run: id,
            events,
            cancel: cancel_rx,
            progress: progress_tx,
        };

        (run, link)
    }

    /// Identifier of the run.
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Ask the worker to stop at its next boundary.
    ///
    /// Idempotent; returns `false` when the run had already finished or been cancelled.
    pub fn cancel(&self) -> bool {
        if self.status().is_terminal() {
            return false;
        }

        !self.cancel.send_replace(true)
    }

    /// Whether cancellation has been requested.
    pub fn is_cancel_requested(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Current lifecycle state, as reported by the worker.
    ///
    /// A cancelled run stays `Running` until the worker observes the request; see
    /// [`SolverRun::is_cancel_requested`].
    pub fn status(&self) -> RunStatus {
        self.progress.borrow().status
    }

    /// Latest progress snapshot.
    pub fn progress(&self) -> RunProgress {
        self.with_request(*self.progress.borrow())
    }

    fn with_request(&self, progress: RunProgress) -> RunProgress {
        RunProgress {
            cancel_requested: self.is_cancel_requested(),
            ..progress
        }
    }

    /// Whether the worker is still enumerating.
    pub fn is_active(&self) -> bool {
        !self.status().is_terminal()
    }

    /// Wait until the run reaches a terminal state and return its final progress.
    pub async fn finished(&self) -> RunProgress {
        let mut progress = self.progress.clone();

        let settled = progress
            .wait_for(|snapshot| snapshot.status.is_terminal())
            .await
            .map(|snapshot| *snapshot);

        let snapshot = match settled {
            Ok(snapshot) => snapshot,
            Err(_closed) => *progress.borrow(),
        };

        self.with_request(snapshot)
    }
}

/// Worker-side half of a run.
#[derive(Debug)]
pub(crate) struct WorkerLink {
    run: RunId,
    events: mpsc::UnboundedSender<RunEvent>,
    cancel: watch::Receiver<bool>,
    progress: watch::Sender<RunProgress>,
}

impl WorkerLink {
    pub(crate) fn run(&self) -> RunId {
        self.run
    }

    /// Record the terminal status of the run.
    pub(crate) fn settle(&self, status: RunStatus, scanned: u64, matched: u64) {
        self.progress.send_modify(|progress| {
            progress.status = status;
            progress.scanned = scanned;
            progress.matched = matched;
        });
    }

    /// Report a fault as the run's terminal `ERROR` event.
    pub(crate) fn fail(&self, fault: &EngineFault) {
        self.progress.send_modify(|progress| {
            progress.status = RunStatus::Failed;
        });

        let event = SolverEvent::Error {
            message: fault.to_string(),
        };

        if self.events.send(RunEvent::new(self.run, event)).is_err() {
            warn!(run = %self.run, "event channel closed before the fault was reported");
        }
    }
}

impl EventSink for WorkerLink {
    fn is_cancelled(&self) -> bool {
        // A dropped run handle cancels too.
        *self.cancel.borrow() || self.cancel.has_changed().is_err()
    }

    fn emit(&mut self, event: SolverEvent) -> Result<(), ChannelFault> {
        // The status turns terminal before the caller can observe the terminal event.
        if let SolverEvent::Done { cancelled, .. } = &event {
            let status = if *cancelled {
                RunStatus::Cancelled
            } else {
                RunStatus::Done
            };

            self.progress.send_modify(|progress| progress.status = status);
        }

        self.events
            .send(RunEvent::new(self.run, event))
            .map_err(|_err| ChannelFault { run: self.run })
    }

    fn checkpoint(&mut self, scanned: u64, matched: u64) {
        self.progress.send_modify(|progress| {
            progress.scanned = scanned;
            progress.matched = matched;
        });

        thread::yield_now();
    }
}
