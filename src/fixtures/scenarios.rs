//! Scenario Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, Scenario, parse_currency, parse_price, price_table},
    request::SolveRequestMessage,
};

/// Scenario Fixture
#[derive(Debug, Deserialize)]
pub struct ScenarioFixture {
    /// Scenario description
    #[serde(default)]
    pub description: Option<String>,

    /// Ratings already held
    #[serde(default)]
    pub existing: Vec<i64>,

    /// One rating per slot to fill
    #[serde(rename = "try")]
    pub ratings_to_try: Vec<i64>,

    /// Target rating
    #[serde(default)]
    pub target: Option<i64>,

    /// Currency code used when no price is given (defaults to GBP)
    #[serde(default)]
    pub currency: Option<String>,

    /// Map of rating -> price (e.g., "2.99 GBP")
    #[serde(default)]
    pub prices: FxHashMap<i64, String>,
}

impl ScenarioFixture {
    /// Convert the fixture into a named scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if a price or currency is invalid or the prices mix currencies.
    pub fn into_scenario(self, name: &str) -> Result<Scenario<'static>, FixtureError> {
        let currency = match (&self.currency, self.prices.values().next()) {
            (Some(code), _) => parse_currency(code)?,
            (None, Some(price)) => parse_price(price)?.1,
            (None, None) => parse_currency("GBP")?,
        };

        let mut entries: Vec<(i64, &str)> = self
            .prices
            .iter()
            .map(|(rating, price)| (*rating, price.as_str()))
            .collect();

        entries.sort_unstable_by_key(|(rating, _)| *rating);

        let prices = price_table(currency, entries)?;

        Ok(Scenario {
            name: name.to_string(),
            description: self.description,
            request: SolveRequestMessage {
                existing_ratings: self.existing,
                ratings_to_try: self.ratings_to_try,
                target_rating: self.target,
            },
            prices,
        })
    }
}

/// Parse a scenario from YAML.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or its prices are invalid.
pub fn parse_scenario(name: &str, contents: &str) -> Result<Scenario<'static>, FixtureError> {
    let fixture: ScenarioFixture = serde_norway::from_str(contents)?;

    fixture.into_scenario(name)
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{EUR, GBP},
    };
    use testresult::TestResult;

    use crate::ratings::Rating;

    use super::*;

    #[test]
    fn parses_a_full_scenario() -> TestResult {
        let scenario = parse_scenario(
            "split",
            r#"
description: Two slots either side of the target
existing: [80, 82]
try: [75, 85]
target: 80
prices:
  75: "4.00 GBP"
  85: "11.00 GBP"
"#,
        )?;

        assert_eq!(scenario.name, "split");
        assert_eq!(scenario.request.existing_ratings, vec![80, 82]);
        assert_eq!(scenario.request.ratings_to_try, vec![75, 85]);
        assert_eq!(scenario.request.target_rating, Some(80));
        assert_eq!(scenario.currency(), GBP);
        assert_eq!(
            scenario.prices.unit_price(Rating::try_from(85_u8)?),
            Money::from_minor(1_100, GBP)
        );

        Ok(())
    }

    #[test]
    fn currency_defaults_without_prices() -> TestResult {
        let scenario = parse_scenario("bare", "try: [85]\ntarget: 85\n")?;

        assert_eq!(scenario.currency(), GBP);
        assert!(scenario.prices.is_empty());
        assert!(scenario.request.existing_ratings.is_empty());

        Ok(())
    }

    #[test]
    fn explicit_currency_wins() -> TestResult {
        let scenario = parse_scenario("euro", "try: [85]\ntarget: 85\ncurrency: EUR\n")?;

        assert_eq!(scenario.currency(), EUR);

        Ok(())
    }

    #[test]
    fn missing_try_is_a_yaml_error() {
        assert!(matches!(
            parse_scenario("broken", "target: 85\n"),
            Err(FixtureError::Yaml(_))
        ));
    }

    #[test]
    fn mismatched_prices_are_rejected() {
        let result = parse_scenario(
            "mixed",
            "try: [80]\ntarget: 80\ncurrency: GBP\nprices:\n  80: \"1.00 USD\"\n",
        );

        assert!(matches!(result, Err(FixtureError::Prices(_))));
    }
}
