//! Income Core - dividend portfolio analysis library.
//!
//! This crate provides the computational core of a passive-income planner:
//!
//! - **Market indicators**: provider quotes normalized into total records, memoized per session
//! - **Opportunity ranking**: dividend screen scored by yield, ROE and P/E
//! - **Portfolio analysis**: yield on cost, market value and projected income
//! - **Growth simulation**: dividend reinvestment toward monthly-income milestones
//!
//! # Example
//!
//! ```rust
//! use income_core::market::{IndicatorAggregator, ProviderError, ProviderQuote};
//! use income_core::{GrowthSimulator, OpportunityRanker, SimulationAssumptions};
//!
//! let aggregator = IndicatorAggregator::new(|ticker: &str| -> Result<ProviderQuote, ProviderError> {
//!     match ticker {
//!         "TAEE11" => Ok(ProviderQuote {
//!             current_price: Some(36.0),
//!             trailing_pe: Some(8.0),
//!             dividend_yield: Some(0.095),
//!             return_on_equity: Some(0.2),
//!             ..Default::default()
//!         }),
//!         _ => Err(ProviderError::UnknownTicker(ticker.to_string())),
//!     }
//! });
//!
//! let ranked = OpportunityRanker::default().rank(&aggregator, &["TAEE11", "XXXX3"]);
//! assert_eq!(ranked.len(), 1);
//! assert_eq!(ranked[0].score, 1.7);
//!
//! let outcome = GrowthSimulator::default().run(&SimulationAssumptions::default())?;
//! println!("10k/month after {} months", outcome.months());
//! # Ok::<(), income_core::Error>(())
//! ```

pub mod config;
pub mod market;
pub mod portfolio;
pub mod ranking;
pub mod simulation;
pub mod types;

// Re-export commonly used types
pub use types::{
    ApiResponse, IndicatorRecord, MilestoneCrossing, PositionAnalysis, PositionInput,
    ScoredCandidate, SimulationAssumptions, SimulationStep,
};

// Re-export main functionality
pub use config::Settings;
pub use market::{IndicatorAggregator, MarketDataProvider};
pub use portfolio::{analyze_positions, yield_on_cost, PortfolioSummary, PortfolioTracker};
pub use ranking::{opportunity_score, OpportunityRanker, RankingCriteria};
pub use simulation::{GrowthSimulator, MilestoneSet, SimulationOutcome};

/// Error types for income-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid assumption: {0}")]
    InvalidAssumption(String),

    #[error("Income stopped progressing after {months} months at {monthly_income:.2}/month")]
    NonProgress { months: u32, monthly_income: f64 },

    #[error("Top milestone not reached within {max_months} months ({monthly_income:.2}/month)")]
    MilestoneNotReached { max_months: u32, monthly_income: f64 },

    #[error("Average price must be positive, got {0}")]
    InvalidDivisor(f64),

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for income-core operations.
pub type Result<T> = std::result::Result<T, Error>;
