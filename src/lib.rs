//! Squad Solver
//!
//! Finds every combination of ratings that, added to the ratings a squad already
//! holds, lands the squad's floor-average rating exactly on a target. The search
//! runs on a Tokio blocking worker, streams results back in chunks and can be
//! cancelled at any time; results are priced and kept cheapest first.
//!
//! ```no_run
//! use squad_solver::prelude::*;
//!
//! # async fn run() -> Result<(), SessionError> {
//! let prices = PriceTable::new(rusty_money::iso::GBP);
//! let mut session = SolverSession::new(&SolverConfig::default(), prices)?;
//!
//! session.start(&SolveRequestMessage {
//!     existing_ratings: vec![80, 82],
//!     ratings_to_try: vec![75, 85],
//!     target_rating: Some(80),
//! })?;
//!
//! let outcome = session.run_to_completion(None).await?;
//! assert_eq!(outcome.solutions, 1);
//! # Ok(())
//! # }
//! ```

pub mod combinations;
pub mod config;
pub mod events;
pub mod fixtures;
pub mod observability;
pub mod predicate;
pub mod prelude;
pub mod prices;
pub mod ratings;
pub mod report;
pub mod request;
pub mod solutions;
pub mod solvers;
