//! TOML settings.
//!
//! Looked up at `INCOME_CONFIG`, then `<config dir>/income-core/config.toml`.
//! A missing file means defaults.
//!
//! ```toml
//! portfolio_file = "/home/me/portfolio.json"
//!
//! [simulation]
//! initial_capital = 10000
//! monthly_contribution = 2000
//! annual_yield_pct = 8.0
//! max_months = 1200
//! milestones = [
//!     { threshold = 100, label = "R$ 100/mês" },
//!     { threshold = 1000, label = "R$ 1000/mês" },
//! ]
//!
//! [ranking]
//! min_dividend_yield_pct = 6.0
//! max_price_to_earnings = 15.0
//! candidates = ["BBAS3", "TAEE11", "CMIG4"]
//!
//! [market]
//! quotes_file = "quotes.json"
//! concurrency = 4
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::market::{IndicatorAggregator, MarketDataProvider, OfflineProvider, QuoteFileProvider};
use crate::ranking::{OpportunityRanker, RankingCriteria};
use crate::simulation::{GrowthSimulator, MilestoneSet, DEFAULT_MAX_MONTHS};
use crate::types::SimulationAssumptions;
use crate::Result;

/// Candidate universe ranked when none is given.
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "BBAS3", "BBSE3", "CMIG4", "CPLE6", "ITSA4", "KLBN4", "PETR4", "SANB11", "TAEE11", "TRPL4",
    "VALE3",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationSettings {
    pub initial_capital: f64,
    pub monthly_contribution: f64,
    pub annual_yield_pct: f64,
    pub max_months: u32,
    pub milestones: MilestoneSet,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        let assumptions = SimulationAssumptions::default();
        Self {
            initial_capital: assumptions.initial_capital,
            monthly_contribution: assumptions.monthly_contribution,
            annual_yield_pct: assumptions.annual_yield_pct,
            max_months: DEFAULT_MAX_MONTHS,
            milestones: MilestoneSet::default(),
        }
    }
}

impl SimulationSettings {
    /// Configured default assumptions.
    pub fn assumptions(&self) -> SimulationAssumptions {
        SimulationAssumptions {
            initial_capital: self.initial_capital,
            monthly_contribution: self.monthly_contribution,
            annual_yield_pct: self.annual_yield_pct,
        }
    }

    pub fn simulator(&self) -> GrowthSimulator {
        GrowthSimulator::new(self.milestones.clone()).with_max_months(self.max_months)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingSettings {
    #[serde(flatten)]
    pub criteria: RankingCriteria,
    pub candidates: Vec<String>,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            criteria: RankingCriteria::default(),
            candidates: DEFAULT_CANDIDATES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl RankingSettings {
    pub fn ranker(&self) -> OpportunityRanker {
        OpportunityRanker::new(self.criteria)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketSettings {
    /// JSON quote snapshot; without one every lookup falls back
    pub quotes_file: Option<PathBuf>,
    /// Maximum concurrent provider lookups
    pub concurrency: usize,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            quotes_file: None,
            concurrency: 1,
        }
    }
}

impl MarketSettings {
    /// Build a fresh analysis session over the configured provider.
    pub fn aggregator(&self) -> Result<IndicatorAggregator> {
        let provider: Box<dyn MarketDataProvider> = match &self.quotes_file {
            Some(path) => Box::new(QuoteFileProvider::load(path)?),
            None => {
                tracing::info!("No quotes file configured; indicators will use fallbacks");
                Box::new(OfflineProvider)
            }
        };
        Ok(IndicatorAggregator::from_boxed(provider).with_concurrency(self.concurrency))
    }
}

/// All user settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub portfolio_file: Option<PathBuf>,
    pub simulation: SimulationSettings,
    pub ranking: RankingSettings,
    pub market: MarketSettings,
}

impl Settings {
    /// Default settings file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("INCOME_CONFIG") {
            return PathBuf::from(path);
        }

        directories::ProjectDirs::from("", "", "income-core")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("income-core.toml"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.simulation.assumptions().validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from_path(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.simulation.assumptions(), SimulationAssumptions::default());
        assert_eq!(settings.ranking.criteria.min_dividend_yield_pct, 6.0);
        assert_eq!(settings.market.concurrency, 1);
    }

    #[test]
    fn test_parse_full_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
portfolio_file = "/tmp/portfolio.json"

[simulation]
initial_capital = 5000
monthly_contribution = 1500
annual_yield_pct = 9.5
max_months = 600
milestones = [
    { threshold = 1000, label = "R$ 1000/mês" },
    { threshold = 100, label = "R$ 100/mês" },
]

[ranking]
min_dividend_yield_pct = 7.0
candidates = ["TAEE11", "CMIG4"]

[market]
concurrency = 4
"#,
        )
        .unwrap();

        let settings = Settings::load_from_path(&path).unwrap();
        assert_eq!(settings.portfolio_file, Some(PathBuf::from("/tmp/portfolio.json")));
        assert_eq!(settings.simulation.initial_capital, 5000.0);
        assert_eq!(settings.simulation.annual_yield_pct, 9.5);
        assert_eq!(settings.simulation.max_months, 600);
        assert_eq!(settings.simulation.milestones.top(), 1000.0);
        assert_eq!(
            settings.simulation.milestones.iter().next().map(|m| m.label.as_str()),
            Some("R$ 100/mês")
        );
        assert_eq!(settings.ranking.criteria.min_dividend_yield_pct, 7.0);
        assert_eq!(settings.ranking.criteria.max_price_to_earnings, 15.0);
        assert_eq!(settings.ranking.candidates, vec!["TAEE11", "CMIG4"]);
        assert_eq!(settings.market.concurrency, 4);
        assert!(settings.market.quotes_file.is_none());

        let simulator = settings.simulation.simulator();
        assert_eq!(simulator.max_months(), 600);
    }

    #[test]
    fn test_rejects_negative_assumption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[simulation]\nmonthly_contribution = -10\n").unwrap();

        assert!(matches!(
            Settings::load_from_path(&path),
            Err(Error::InvalidAssumption(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[simulation\n").unwrap();

        assert!(matches!(Settings::load_from_path(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_market_aggregator_from_quotes_file() {
        let dir = tempdir().unwrap();
        let quotes = dir.path().join("quotes.json");
        fs::write(
            &quotes,
            r#"{"TAEE11":{"longName":"Taesa","currentPrice":36.0,"dividendYield":0.095,"trailingPE":8.0}}"#,
        )
        .unwrap();

        let market = MarketSettings {
            quotes_file: Some(quotes),
            concurrency: 2,
        };
        let aggregator = market.aggregator().unwrap();
        assert_eq!(aggregator.concurrency(), 2);

        let record = aggregator.fetch("TAEE11");
        assert_eq!(record.company_name, "Taesa");
        assert_eq!(record.dividend_yield_pct, 9.5);
        assert_eq!(aggregator.fetch("CMIG4").company_name, "CMIG4");
    }
}
