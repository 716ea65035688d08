//! Solutions
//!
//! Accepted combinations annotated with their price, kept in ascending price order.

use std::collections::{BTreeMap, btree_map};

use rusty_money::{Money, iso::Currency};

use crate::ratings::RatingCombination;

pub mod session;

/// An accepted combination with its total price.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<'a> {
    id: u64,
    combination: RatingCombination,
    price: Money<'a, Currency>,
}

impl<'a> Solution<'a> {
    /// Create a solution.
    pub fn new(id: u64, combination: RatingCombination, price: Money<'a, Currency>) -> Self {
        Self {
            id,
            combination,
            price,
        }
    }

    /// Position of the solution in enumeration order within its run.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The accepted ratings.
    pub fn combination(&self) -> &RatingCombination {
        &self.combination
    }

    /// Total price of the combination.
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }
}

/// Solutions of one run, cheapest first.
///
/// Keyed on `(minor units, id)`, so equal prices keep enumeration order and each push
/// costs `O(log n)`.
#[derive(Debug, Clone, Default)]
pub struct SolutionSet<'a> {
    solutions: BTreeMap<(i64, u64), Solution<'a>>,
    next_id: u64,
}

impl<'a> SolutionSet<'a> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a combination, assigning it the next id, and return that id.
    pub fn push(&mut self, combination: RatingCombination, price: Money<'a, Currency>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.solutions.insert(
            (price.to_minor_units(), id),
            Solution::new(id, combination, price),
        );

        id
    }

    /// Remove every solution and restart ids from zero.
    pub fn clear(&mut self) {
        self.solutions.clear();
        self.next_id = 0;
    }

    /// The cheapest solution.
    pub fn cheapest(&self) -> Option<&Solution<'a>> {
        self.solutions.values().next()
    }

    /// Iterate over the solutions, cheapest first.
    pub fn iter(&self) -> btree_map::Values<'_, (i64, u64), Solution<'a>> {
        self.solutions.values()
    }

    /// Number of solutions.
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Whether there are no solutions.
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}

impl<'s, 'a> IntoIterator for &'s SolutionSet<'a> {
    type Item = &'s Solution<'a>;
    type IntoIter = btree_map::Values<'s, (i64, u64), Solution<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.values()
    }
}
