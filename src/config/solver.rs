//! Solver Config

use std::num::NonZeroUsize;

use clap::Args;

use crate::{
    ratings::{RatingDomain, RatingError},
    request::{DEFAULT_MAX_SLOTS, RequestLimits},
    solvers::search::{DEFAULT_CANCEL_CHECK_INTERVAL, DEFAULT_CHUNK_SIZE, SearchSettings},
};

/// Solver engine settings.
#[derive(Debug, Clone, Args)]
pub struct SolverConfig {
    /// Accepted combinations per streamed chunk
    #[arg(long, env = "SOLVER_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: NonZeroUsize,

    /// Scanned combinations between cancellation checks
    #[arg(
        long,
        env = "SOLVER_CANCEL_CHECK_INTERVAL",
        default_value_t = DEFAULT_CANCEL_CHECK_INTERVAL
    )]
    pub cancel_check_interval: NonZeroUsize,

    /// Lowest accepted rating
    #[arg(long, env = "SOLVER_MIN_RATING", default_value_t = RatingDomain::DEFAULT_MIN)]
    pub min_rating: u8,

    /// Highest accepted rating
    #[arg(long, env = "SOLVER_MAX_RATING", default_value_t = RatingDomain::DEFAULT_MAX)]
    pub max_rating: u8,

    /// Most slots a single request may fill
    #[arg(long, env = "SOLVER_MAX_SLOTS", default_value_t = DEFAULT_MAX_SLOTS)]
    pub max_slots: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel_check_interval: DEFAULT_CANCEL_CHECK_INTERVAL,
            min_rating: RatingDomain::DEFAULT_MIN,
            max_rating: RatingDomain::DEFAULT_MAX,
            max_slots: DEFAULT_MAX_SLOTS,
        }
    }
}

impl SolverConfig {
    /// Bounds requests are validated against.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::InvalidDomain`] if the rating bounds are inverted or zero.
    pub fn limits(&self) -> Result<RequestLimits, RatingError> {
        Ok(RequestLimits {
            domain: RatingDomain::new(self.min_rating, self.max_rating)?,
            max_slots: self.max_slots,
        })
    }

    /// Chunking and cancellation tuning for the search.
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            chunk_size: self.chunk_size,
            cancel_check_interval: self.cancel_check_interval,
        }
    }
}
