//! Solve Requests

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::ratings::{INLINE_SLOTS, Rating, RatingDomain, RatingError};

/// Default upper bound on the number of slots one request may fill.
pub const DEFAULT_MAX_SLOTS: usize = 23;

/// Reasons a request is rejected before any search starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// No target rating was supplied, or the sentinel `-1`/a non-positive value was.
    #[error("a positive target rating is required")]
    MissingTarget,

    /// No ratings to try, so there are no slots to fill.
    #[error("at least one rating to try is required")]
    EmptyCandidates,

    /// More slots than the configured limit.
    #[error("{requested} slots requested, at most {max} are supported")]
    TooManySlots {
        /// Number of ratings to try supplied
        requested: usize,
        /// Configured limit
        max: usize,
    },

    /// A rating in one of the request fields is not acceptable.
    #[error("invalid {field}: {source}")]
    InvalidRating {
        /// Field holding the rating
        field: &'static str,
        /// Underlying rating error
        source: RatingError,
    },
}

/// Bounds a request is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Acceptable ratings
    pub domain: RatingDomain,

    /// Most slots a single request may fill
    pub max_slots: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            domain: RatingDomain::default(),
            max_slots: DEFAULT_MAX_SLOTS,
        }
    }
}

/// A solve request as it crosses the caller boundary.
///
/// `ratings_to_try` holds one rating per slot to fill, so its length fixes the size of
/// every combination. A `target_rating` of `-1` or an absent one is invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequestMessage {
    /// Ratings already held
    #[serde(default)]
    pub existing_ratings: Vec<i64>,

    /// One candidate rating per slot to fill
    #[serde(default)]
    pub ratings_to_try: Vec<i64>,

    /// Target aggregate rating
    #[serde(default)]
    pub target_rating: Option<i64>,
}

impl SolveRequestMessage {
    /// Validate the message into a [`SolveRequest`].
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] describing the first problem found.
    pub fn validate(&self, limits: &RequestLimits) -> Result<SolveRequest, RequestError> {
        let target = match self.target_rating {
            Some(value) if value > 0 => checked(limits.domain, "target rating", value)?,
            _ => return Err(RequestError::MissingTarget),
        };

        if self.ratings_to_try.is_empty() {
            return Err(RequestError::EmptyCandidates);
        }

        if self.ratings_to_try.len() > limits.max_slots {
            return Err(RequestError::TooManySlots {
                requested: self.ratings_to_try.len(),
                max: limits.max_slots,
            });
        }

        let slots = self
            .ratings_to_try
            .iter()
            .map(|&value| checked(limits.domain, "rating to try", value))
            .collect::<Result<SmallVec<[Rating; INLINE_SLOTS]>, _>>()?;

        let existing = self
            .existing_ratings
            .iter()
            .map(|&value| checked(limits.domain, "existing rating", value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SolveRequest::from_parts(existing, slots, target))
    }
}

fn checked(domain: RatingDomain, field: &'static str, value: i64) -> Result<Rating, RequestError> {
    domain
        .rating(value)
        .map_err(|source| RequestError::InvalidRating { field, source })
}

/// A validated, immutable solve request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveRequest {
    existing: Vec<Rating>,
    slots: SmallVec<[Rating; INLINE_SLOTS]>,
    candidates: SmallVec<[Rating; INLINE_SLOTS]>,
    target: Rating,
}

impl SolveRequest {
    /// Create a request from already-constructed ratings.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyCandidates`] when there is nothing to try.
    pub fn new(
        existing: impl Into<Vec<Rating>>,
        ratings_to_try: impl IntoIterator<Item = Rating>,
        target: Rating,
    ) -> Result<Self, RequestError> {
        let slots: SmallVec<[Rating; INLINE_SLOTS]> = ratings_to_try.into_iter().collect();

        if slots.is_empty() {
            return Err(RequestError::EmptyCandidates);
        }

        Ok(Self::from_parts(existing.into(), slots, target))
    }

    fn from_parts(
        existing: Vec<Rating>,
        slots: SmallVec<[Rating; INLINE_SLOTS]>,
        target: Rating,
    ) -> Self {
        let mut candidates = slots.clone();
        candidates.sort_unstable();
        candidates.dedup();

        Self {
            existing,
            slots,
            candidates,
            target,
        }
    }

    /// Ratings already held.
    pub fn existing(&self) -> &[Rating] {
        &self.existing
    }

    /// Ratings to try, one per slot, in the caller's order.
    pub fn slots(&self) -> &[Rating] {
        &self.slots
    }

    /// Distinct candidate ratings, ascending.
    pub fn candidates(&self) -> &[Rating] {
        &self.candidates
    }

    /// Size of every combination (`k`).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Target aggregate rating.
    pub fn target(&self) -> Rating {
        self.target
    }

    /// Convert back into the wire message.
    pub fn to_message(&self) -> SolveRequestMessage {
        SolveRequestMessage {
            existing_ratings: self.existing.iter().copied().map(i64::from).collect(),
            ratings_to_try: self.slots.iter().copied().map(i64::from).collect(),
            target_rating: Some(i64::from(self.target)),
        }
    }
}
