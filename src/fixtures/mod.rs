//! Fixtures

use std::{fs, path::PathBuf};

use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    prices::{PriceTable, PriceTableError},
    ratings::RatingError,
    request::SolveRequestMessage,
};

pub mod prices;
pub mod scenarios;

pub use prices::{parse_currency, parse_price, price_table};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A priced rating is not a rating
    #[error("Invalid priced rating: {0}")]
    Rating(#[from] RatingError),

    /// Prices could not be combined into one table
    #[error(transparent)]
    Prices(#[from] PriceTableError),
}

/// A solve request together with the prices its solutions are annotated with.
#[derive(Debug, Clone)]
pub struct Scenario<'a> {
    /// Scenario name
    pub name: String,

    /// Optional human-readable description
    pub description: Option<String>,

    /// Request to solve
    pub request: SolveRequestMessage,

    /// Unit prices per rating
    pub prices: PriceTable<'a>,
}

impl Scenario<'_> {
    /// Currency of the scenario's prices.
    pub fn currency(&self) -> &Currency {
        self.prices.currency()
    }
}

/// Fixture
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a fixture reader with the default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a fixture reader with a custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Path of a named scenario file
    pub fn scenario_path(&self, name: &str) -> PathBuf {
        self.base_path.join("scenarios").join(format!("{name}.yml"))
    }

    /// Load a scenario from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if its prices are invalid.
    pub fn load_scenario(&self, name: &str) -> Result<Scenario<'static>, FixtureError> {
        let contents = fs::read_to_string(self.scenario_path(name))?;

        scenarios::parse_scenario(name, &contents)
    }

    /// Names of every scenario under the base path, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the scenarios directory cannot be read.
    pub fn scenario_names(&self) -> Result<Vec<String>, FixtureError> {
        let mut names = Vec::new();

        for entry in fs::read_dir(self.base_path.join("scenarios"))? {
            let path = entry?.path();

            if path.extension().is_some_and(|ext| ext == "yml")
                && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            {
                names.push(stem.to_string());
            }
        }

        names.sort();

        Ok(names)
    }
}
