//! Prices

use rustc_hash::FxHashMap;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::ratings::Rating;

/// Errors raised while building or applying a price table.
#[derive(Debug, Error, PartialEq)]
pub enum PriceTableError {
    /// A price was given in a currency other than the table's.
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Currency of the table
        expected: String,
        /// Currency of the rejected price
        found: String,
    },

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Unit price per rating, in a single currency.
///
/// Ratings without an entry are free.
#[derive(Debug, Clone)]
pub struct PriceTable<'a> {
    currency: &'a Currency,
    prices: FxHashMap<Rating, Money<'a, Currency>>,
}

impl<'a> PriceTable<'a> {
    /// Create an empty price table.
    pub fn new(currency: &'a Currency) -> Self {
        Self {
            currency,
            prices: FxHashMap::default(),
        }
    }

    /// Create a price table from `(rating, price)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`PriceTableError::CurrencyMismatch`] if any price is not in `currency`.
    pub fn with_prices(
        currency: &'a Currency,
        prices: impl IntoIterator<Item = (Rating, Money<'a, Currency>)>,
    ) -> Result<Self, PriceTableError> {
        let mut table = Self::new(currency);

        for (rating, price) in prices {
            table.insert(rating, price)?;
        }

        Ok(table)
    }

    /// Set the unit price of a rating, returning the price it replaces.
    ///
    /// # Errors
    ///
    /// Returns [`PriceTableError::CurrencyMismatch`] if the price is not in the table's currency.
    pub fn insert(
        &mut self,
        rating: Rating,
        price: Money<'a, Currency>,
    ) -> Result<Option<Money<'a, Currency>>, PriceTableError> {
        if price.currency() != self.currency {
            return Err(PriceTableError::CurrencyMismatch {
                expected: self.currency.iso_alpha_code.to_string(),
                found: price.currency().iso_alpha_code.to_string(),
            });
        }

        Ok(self.prices.insert(rating, price))
    }

    /// Currency of every price in the table.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Configured price of a rating, if any.
    pub fn get(&self, rating: Rating) -> Option<&Money<'a, Currency>> {
        self.prices.get(&rating)
    }

    /// Unit price of a rating; zero when the rating has no entry.
    pub fn unit_price(&self, rating: Rating) -> Money<'a, Currency> {
        self.get(rating)
            .copied()
            .unwrap_or_else(|| Money::from_minor(0, self.currency))
    }

    /// Number of priced ratings.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no rating has a price.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Total price of a combination of ratings.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceTableError::Money`] if the arithmetic fails.
    pub fn price_of(&self, ratings: &[Rating]) -> Result<Money<'a, Currency>, PriceTableError> {
        let total = ratings.iter().try_fold(
            Money::from_minor(0, self.currency),
            |acc, &rating| acc.add(self.unit_price(rating)),
        )?;

        Ok(total)
    }
}
