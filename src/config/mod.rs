//! Command-line configuration

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser};

use crate::{
    fixtures::{Fixture, FixtureError, Scenario, parse_currency, price_table},
    request::SolveRequestMessage,
};

mod observability;
mod solver;

pub use observability::{LogFormat, LoggingConfig};
pub use solver::SolverConfig;

/// Squad rating solver
#[derive(Debug, Parser)]
#[command(
    name = "squad-solver",
    about = "Find every rating combination that lifts a squad to a target rating",
    long_about = None
)]
pub struct Cli {
    /// Scenario to solve.
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Solver engine settings.
    #[command(flatten)]
    pub solver: SolverConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Stop the search after this many seconds
    #[arg(long, env = "SOLVER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Show at most this many solutions
    #[arg(long)]
    pub limit: Option<usize>,
}

impl Cli {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Timeout imposed on the run, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// A `RATING=AMOUNT` price given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceArg {
    /// Priced rating
    pub rating: i64,

    /// Decimal amount in the scenario currency
    pub amount: String,
}

impl FromStr for PriceArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rating, amount) = s
            .split_once('=')
            .ok_or_else(|| format!("expected RATING=AMOUNT, got {s}"))?;

        let rating = rating
            .trim()
            .parse()
            .map_err(|_err| format!("invalid rating in {s}"))?;

        Ok(Self {
            rating,
            amount: amount.trim().to_string(),
        })
    }
}

/// Where the scenario comes from: a fixture file or inline flags.
#[derive(Debug, Clone, Args)]
pub struct ScenarioArgs {
    /// Load the named scenario from the fixtures directory
    #[arg(short, long, conflicts_with_all = ["existing", "ratings_to_try", "target", "prices"])]
    pub fixture: Option<String>,

    /// Fixtures directory
    #[arg(long, env = "SQUAD_FIXTURES_DIR", default_value = "./fixtures")]
    pub fixtures_dir: PathBuf,

    /// Ratings already in the squad
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub existing: Vec<i64>,

    /// One rating per open slot
    #[arg(long = "try", value_delimiter = ',', num_args = 1..)]
    pub ratings_to_try: Vec<i64>,

    /// Target squad rating
    #[arg(short, long)]
    pub target: Option<i64>,

    /// Unit price of a rating, e.g. `85=11.50`
    #[arg(long = "price")]
    pub prices: Vec<PriceArg>,

    /// Currency of inline prices
    #[arg(long, env = "SOLVER_CURRENCY", default_value = "GBP")]
    pub currency: String,
}

impl ScenarioArgs {
    /// Resolve the scenario described by the arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the fixture cannot be loaded or a price is invalid.
    pub fn scenario(&self) -> Result<Scenario<'static>, FixtureError> {
        if let Some(name) = &self.fixture {
            return Fixture::with_base_path(&self.fixtures_dir).load_scenario(name);
        }

        let currency = parse_currency(&self.currency)?;

        let entries: Vec<(i64, String)> = self
            .prices
            .iter()
            .map(|price| (price.rating, format!("{} {}", price.amount, self.currency)))
            .collect();

        let prices = price_table(
            currency,
            entries
                .iter()
                .map(|(rating, price)| (*rating, price.as_str())),
        )?;

        Ok(Scenario {
            name: "command line".to_string(),
            description: None,
            request: SolveRequestMessage {
                existing_ratings: self.existing.clone(),
                ratings_to_try: self.ratings_to_try.clone(),
                target_rating: self.target,
            },
            prices,
        })
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::ratings::Rating;

    use super::*;

    #[test]
    fn parses_inline_scenario() -> TestResult {
        let cli = Cli::try_parse_from([
            "squad-solver",
            "--existing",
            "80,82",
            "--try",
            "75,85",
            "--target",
            "80",
            "--price",
            "85=11.50",
            "--currency",
            "USD",
            "--timeout-secs",
            "3",
        ])?;

        let scenario = cli.scenario.scenario()?;

        assert_eq!(scenario.request.existing_ratings, vec![80, 82]);
        assert_eq!(scenario.request.ratings_to_try, vec![75, 85]);
        assert_eq!(scenario.request.target_rating, Some(80));
        assert_eq!(
            scenario.prices.unit_price(Rating::try_from(85_u8)?),
            Money::from_minor(1_150, USD)
        );
        assert_eq!(cli.timeout(), Some(Duration::from_secs(3)));

        Ok(())
    }

    #[test]
    fn solver_defaults_apply() -> TestResult {
        let cli = Cli::try_parse_from(["squad-solver", "--try", "85", "--target", "85"])?;

        assert_eq!(cli.solver.chunk_size.get(), 50);
        assert_eq!(cli.solver.max_slots, 23);
        assert_eq!(cli.logging.log_format, LogFormat::Compact);
        assert_eq!(cli.timeout(), None);

        Ok(())
    }

    #[test]
    fn fixture_conflicts_with_inline_ratings() {
        let result = Cli::try_parse_from(["squad-solver", "--fixture", "split-pair", "--target", "80"]);

        assert!(result.is_err());
    }

    #[test]
    fn price_arg_requires_equals() {
        assert!("85".parse::<PriceArg>().is_err());
        assert!("x=1.00".parse::<PriceArg>().is_err());
        assert_eq!(
            " 85 = 2.50 ".parse::<PriceArg>(),
            Ok(PriceArg {
                rating: 85,
                amount: "2.50".to_string()
            })
        );
    }
}
