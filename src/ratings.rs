//! Ratings

use std::{fmt, ops::Deref};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Number of slots a combination stores inline before spilling onto the heap.
pub const INLINE_SLOTS: usize = 11;

/// Errors raised while constructing ratings or rating domains.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// The value cannot be represented as a rating (ratings are positive and fit in a byte).
    #[error("{0} is not a valid rating")]
    NotARating(i64),

    /// The rating falls outside the configured domain.
    #[error("rating {value} is outside the domain {min}..={max}")]
    OutsideDomain {
        /// Offending rating
        value: u8,
        /// Lowest allowed rating
        min: u8,
        /// Highest allowed rating
        max: u8,
    },

    /// The domain bounds are inverted or zero.
    #[error("invalid rating domain {min}..={max}")]
    InvalidDomain {
        /// Requested lower bound
        min: u8,
        /// Requested upper bound
        max: u8,
    },
}

/// A positive integer rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    /// Returns the numeric value of the rating.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(rating) if rating > 0 => Ok(Rating(rating)),
            _ => Err(RatingError::NotARating(value)),
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::try_from(i64::from(value))
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        i64::from(rating.0)
    }
}

impl From<Rating> for u64 {
    fn from(rating: Rating) -> Self {
        u64::from(rating.0)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds ratings from raw values.
///
/// # Errors
///
/// Returns [`RatingError::NotARating`] for the first zero value.
pub fn ratings(values: &[u8]) -> Result<Vec<Rating>, RatingError> {
    values.iter().copied().map(Rating::try_from).collect()
}

/// Inclusive range of ratings an application accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingDomain {
    min: Rating,
    max: Rating,
}

impl RatingDomain {
    /// Lowest rating in the default domain.
    pub const DEFAULT_MIN: u8 = 1;

    /// Highest rating in the default domain.
    pub const DEFAULT_MAX: u8 = 99;

    /// Create a new domain.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::InvalidDomain`] when `min` is zero or greater than `max`.
    pub fn new(min: u8, max: u8) -> Result<Self, RatingError> {
        if min == 0 || min > max {
            return Err(RatingError::InvalidDomain { min, max });
        }

        Ok(Self {
            min: Rating(min),
            max: Rating(max),
        })
    }

    /// Lowest rating in the domain.
    pub fn min(self) -> Rating {
        self.min
    }

    /// Highest rating in the domain.
    pub fn max(self) -> Rating {
        self.max
    }

    /// Check whether a rating lies within the domain.
    pub fn contains(self, rating: Rating) -> bool {
        (self.min..=self.max).contains(&rating)
    }

    /// Convert a raw value into a rating from this domain.
    ///
    /// # Errors
    ///
    /// Returns a [`RatingError`] when the value is not a rating or lies outside the domain.
    pub fn rating(self, value: i64) -> Result<Rating, RatingError> {
        let rating = Rating::try_from(value)?;

        if self.contains(rating) {
            Ok(rating)
        } else {
            Err(RatingError::OutsideDomain {
                value: rating.value(),
                min: self.min.value(),
                max: self.max.value(),
            })
        }
    }

    /// Iterate over every rating in the domain, lowest first.
    pub fn iter(self) -> impl Iterator<Item = Rating> {
        (self.min.value()..=self.max.value()).map(Rating)
    }
}

impl Default for RatingDomain {
    fn default() -> Self {
        Self {
            min: Rating(Self::DEFAULT_MIN),
            max: Rating(Self::DEFAULT_MAX),
        }
    }
}

/// A fixed-length sequence of ratings added on top of the existing holdings.
///
/// The order is kept for display; two combinations that are permutations of one
/// another describe the same multiset (see [`RatingCombination::canonical`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingCombination(SmallVec<[Rating; INLINE_SLOTS]>);

impl RatingCombination {
    /// Create a combination from a list of ratings.
    pub fn new(ratings: impl IntoIterator<Item = Rating>) -> Self {
        ratings.into_iter().collect()
    }

    /// Sum of all ratings in the combination.
    pub fn sum(&self) -> u64 {
        self.0.iter().copied().map(u64::from).sum()
    }

    /// Returns the multiset key of the combination: its ratings in ascending order.
    #[must_use]
    pub fn canonical(&self) -> Self {
        let mut sorted = self.0.clone();
        sorted.sort_unstable();

        Self(sorted)
    }

    /// Raw rating values, in combination order.
    pub fn values(&self) -> Vec<u8> {
        self.0.iter().map(|rating| rating.value()).collect()
    }
}

impl Deref for RatingCombination {
    type Target = [Rating];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Rating> for RatingCombination {
    fn from_iter<I: IntoIterator<Item = Rating>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RatingCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;

        for (idx, rating) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }

            write!(f, "{rating}")?;
        }

        write!(f, "]")
    }
}
