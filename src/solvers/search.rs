//! Chunked Search
//!
//! Drives [`Multisets`] through a [`TargetPredicate`] and hands accepted combinations to
//! an [`EventSink`] in chunks. The sink owns the transport; this module only decides
//! what to emit and when to look for cancellation.

use std::{mem, num::NonZeroUsize};

use tracing::debug;

use crate::{
    combinations::Multisets,
    events::SolverEvent,
    predicate::TargetPredicate,
    ratings::RatingCombination,
    request::SolveRequest,
    solvers::{ChannelFault, EngineFault},
};

/// Default number of accepted combinations per chunk.
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(50) {
    Some(size) => size,
    None => NonZeroUsize::MIN,
};

/// Default number of scanned candidates between cancellation checks when no chunk fills.
pub const DEFAULT_CANCEL_CHECK_INTERVAL: NonZeroUsize = match NonZeroUsize::new(4096) {
    Some(interval) => interval,
    None => NonZeroUsize::MIN,
};

/// Receives the events of one search.
pub trait EventSink {
    /// Whether the caller has asked the search to stop.
    fn is_cancelled(&self) -> bool;

    /// Deliver an event to the caller.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelFault`] when the caller can no longer receive events.
    fn emit(&mut self, event: SolverEvent) -> Result<(), ChannelFault>;

    /// Called at every boundary where cancellation is checked.
    fn checkpoint(&mut self, _scanned: u64, _matched: u64) {}
}

/// Tuning for the chunked search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Accepted combinations per `IN_PROGRESS` event
    pub chunk_size: NonZeroUsize,

    /// Scanned candidates between cancellation checks while no chunk fills
    pub cancel_check_interval: NonZeroUsize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel_check_interval: DEFAULT_CANCEL_CHECK_INTERVAL,
        }
    }
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Every combination was examined.
    Exhausted,

    /// The sink reported cancellation at a boundary.
    Cancelled,

    /// The sink stopped accepting events.
    Disconnected,
}

/// Counters for a finished search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSummary {
    /// How the search ended
    pub outcome: SearchOutcome,

    /// Combinations examined
    pub scanned: u64,

    /// Combinations accepted by the predicate
    pub matched: u64,

    /// Events emitted, including the terminal one
    pub events: u64,
}

struct ChunkBuffer<'s, S: ?Sized> {
    sink: &'s mut S,
    chunk: Vec<RatingCombination>,
    chunk_size: usize,
    scanned: u64,
    matched: u64,
    events: u64,
}

impl<S: EventSink + ?Sized> ChunkBuffer<'_, S> {
    fn summary(&self, outcome: SearchOutcome) -> SearchSummary {
        SearchSummary {
            outcome,
            scanned: self.scanned,
            matched: self.matched,
            events: self.events,
        }
    }

    fn flush(&mut self) -> Result<(), ChannelFault> {
        let result_chunk = mem::replace(&mut self.chunk, Vec::with_capacity(self.chunk_size));

        debug!(size = result_chunk.len(), scanned = self.scanned, "emitting chunk");

        self.sink.emit(SolverEvent::InProgress { result_chunk })?;
        self.events += 1;

        Ok(())
    }

    fn finish(&mut self, cancelled: bool) -> SearchSummary {
        let result_chunk = mem::take(&mut self.chunk);

        self.sink.checkpoint(self.scanned, self.matched);

        if self
            .sink
            .emit(SolverEvent::Done {
                result_chunk,
                cancelled,
            })
            .is_err()
        {
            return self.summary(SearchOutcome::Disconnected);
        }

        self.events += 1;

        self.summary(if cancelled {
            SearchOutcome::Cancelled
        } else {
            SearchOutcome::Exhausted
        })
    }
}

/// Run a search to completion, cancellation or disconnection.
///
/// Full chunks go out as [`SolverEvent::InProgress`]; the run always ends with a single
/// [`SolverEvent::Done`] carrying any remaining matches, unless the sink disconnects.
/// Cancellation is checked before each chunk is emitted and after every
/// `cancel_check_interval` scanned candidates, never per candidate.
///
/// # Errors
///
/// Returns an [`EngineFault`] if the predicate fails. No terminal event is emitted in
/// that case; the caller reports the fault.
pub fn search<P, S>(
    request: &SolveRequest,
    predicate: &P,
    settings: SearchSettings,
    sink: &mut S,
) -> Result<SearchSummary, EngineFault>
where
    P: TargetPredicate + ?Sized,
    S: EventSink + ?Sized,
{
    let chunk_size = settings.chunk_size.get();
    let interval = settings.cancel_check_interval.get();

    let mut buffer = ChunkBuffer {
        sink,
        chunk: Vec::with_capacity(chunk_size),
        chunk_size,
        scanned: 0,
        matched: 0,
        events: 0,
    };

    let mut since_check = 0_usize;

    for combination in Multisets::new(request.candidates().iter().copied(), request.slot_count()) {
        buffer.scanned += 1;
        since_check += 1;

        if predicate.is_match(request.existing(), &combination, request.target())? {
            buffer.matched += 1;
            buffer.chunk.push(combination);

            if buffer.chunk.len() >= chunk_size {
                since_check = 0;

                if buffer.sink.is_cancelled() {
                    return Ok(buffer.finish(true));
                }

                if buffer.flush().is_err() {
                    return Ok(buffer.summary(SearchOutcome::Disconnected));
                }

                buffer.sink.checkpoint(buffer.scanned, buffer.matched);

                continue;
            }
        }

        if since_check >= interval {
            since_check = 0;

            buffer.sink.checkpoint(buffer.scanned, buffer.matched);

            if buffer.sink.is_cancelled() {
                return Ok(buffer.finish(true));
            }
        }
    }

    Ok(buffer.finish(false))
}
