//! Squad solver prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    combinations::{Multisets, multiset_count},
    config::{Cli, LogFormat, LoggingConfig, SolverConfig},
    events::{RunEvent, RunId, SolverEvent},
    fixtures::{Fixture, FixtureError, Scenario},
    predicate::{FloorAverage, PredicateError, TargetPredicate},
    prices::{PriceTable, PriceTableError},
    ratings::{Rating, RatingCombination, RatingDomain, RatingError},
    report::{ReportError, write_outcome, write_solutions},
    request::{RequestError, RequestLimits, SolveRequest, SolveRequestMessage},
    solutions::{
        Solution, SolutionSet,
        session::{RunOutcome, SessionError, SessionUpdate, SolverSession},
    },
    solvers::{
        ChannelFault, EngineFault, SolverError,
        engine::{ResultChannel, SolverEngine},
        run::{RunProgress, RunStatus, SolverRun},
        search::{EventSink, SearchOutcome, SearchSettings, SearchSummary, search},
    },
};
