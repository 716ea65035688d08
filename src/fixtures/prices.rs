//! Price Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};

use crate::{fixtures::FixtureError, prices::PriceTable, ratings::Rating};

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let minor_units = amount
        .parse::<Decimal>()
        .ok()
        .and_then(|value| value.checked_mul(Decimal::new(100, 0)))
        .and_then(|value| value.round_dp(0).to_i64())
        .filter(|minor| *minor >= 0)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, parse_currency(currency_code)?))
}

/// Look up a supported currency by its ISO code
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for anything but GBP, USD and EUR.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}

/// Build a price table from `(rating, "AMOUNT CURRENCY")` entries
///
/// # Errors
///
/// Returns an error if a rating or price is invalid, or if the prices mix currencies.
pub fn price_table<'p>(
    currency: &'static Currency,
    entries: impl IntoIterator<Item = (i64, &'p str)>,
) -> Result<PriceTable<'static>, FixtureError> {
    let mut table = PriceTable::new(currency);

    for (rating, price) in entries {
        let (minor_units, price_currency) = parse_price(price)?;

        table.insert(
            Rating::try_from(rating)?,
            Money::from_minor(minor_units, price_currency),
        )?;
    }

    Ok(table)
}
