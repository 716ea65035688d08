//! Target Predicate
//!
//! Decides whether a candidate combination, added to the existing ratings, lands on the
//! target. The aggregate is the integer (floor) average over every rated entry, so a
//! fractional average that truncates to the target is a match.

use std::fmt;

use thiserror::Error;

use crate::ratings::Rating;

/// Errors raised while evaluating a target predicate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PredicateError {
    /// There is nothing to average.
    #[error("cannot average an empty set of ratings")]
    NoRatings,

    /// The rating total does not fit the accumulator.
    #[error("rating total overflowed while averaging {count} ratings")]
    Overflow {
        /// Number of ratings being averaged
        count: usize,
    },
}

/// Decides whether existing plus candidate ratings satisfy a target.
pub trait TargetPredicate: fmt::Debug + Send + Sync {
    /// Returns `true` when the aggregate of `existing` and `candidate` satisfies `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`PredicateError`] when the aggregate cannot be computed.
    fn is_match(
        &self,
        existing: &[Rating],
        candidate: &[Rating],
        target: Rating,
    ) -> Result<bool, PredicateError>;
}

/// Matches when the floor of the average rating equals the target exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloorAverage;

impl TargetPredicate for FloorAverage {
    fn is_match(
        &self,
        existing: &[Rating],
        candidate: &[Rating],
        target: Rating,
    ) -> Result<bool, PredicateError> {
        is_target_rating(existing, candidate, target)
    }
}

/// Floor of the average across `existing` and `candidate`.
///
/// # Errors
///
/// - [`PredicateError::NoRatings`]: both slices are empty.
/// - [`PredicateError::Overflow`]: the rating total does not fit in a `u64`.
pub fn floor_average(existing: &[Rating], candidate: &[Rating]) -> Result<u64, PredicateError> {
    let count = existing.len() + candidate.len();

    if count == 0 {
        return Err(PredicateError::NoRatings);
    }

    let total = existing
        .iter()
        .chain(candidate)
        .try_fold(0_u64, |acc, rating| acc.checked_add(u64::from(*rating)))
        .ok_or(PredicateError::Overflow { count })?;

    let divisor = u64::try_from(count).map_err(|_err| PredicateError::Overflow { count })?;

    Ok(total / divisor)
}

/// Whether `existing` plus `candidate` floor-average to exactly `target`.
///
/// # Errors
///
/// Returns a [`PredicateError`] when the average cannot be computed.
pub fn is_target_rating(
    existing: &[Rating],
    candidate: &[Rating],
    target: Rating,
) -> Result<bool, PredicateError> {
    Ok(floor_average(existing, candidate)? == u64::from(target))
}
