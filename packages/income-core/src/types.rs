//! Core data types for the income analysis system.

use serde::{Deserialize, Serialize};

/// Placeholder used for textual fields the market-data provider did not return.
pub const UNKNOWN_TEXT: &str = "-";

/// Round `value` to `decimals` decimal places.
pub fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Normalize a ticker symbol (trimmed, uppercase).
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// A holding as loaded from the portfolio source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionInput {
    /// Ticker symbol (uppercase)
    pub ticker: String,
    /// Number of shares or fund units held
    pub quantity: f64,
    /// Average purchase price per unit, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_price: Option<f64>,
}

impl PositionInput {
    /// Create a position without an average price.
    pub fn new(ticker: &str, quantity: f64) -> Self {
        Self {
            ticker: normalize_ticker(ticker),
            quantity,
            average_price: None,
        }
    }

    /// Attach an average purchase price.
    pub fn with_average_price(mut self, average_price: f64) -> Self {
        self.average_price = Some(average_price);
        self
    }

    /// Total amount paid for the position, if the average price is known.
    pub fn total_cost(&self) -> Option<f64> {
        self.average_price.map(|price| price * self.quantity)
    }
}

/// Normalized per-ticker market indicators.
///
/// A record is always total: when the provider omits a field the documented
/// sentinel is stored instead. Numeric zero means "unknown" for the price,
/// P/E, dividend yield and ROE fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorRecord {
    /// Ticker symbol (uppercase)
    pub ticker: String,
    /// Company or fund name, `"-"` when unknown
    pub company_name: String,
    /// Sector, `"-"` when unknown
    pub sector: String,
    /// Last traded price, `0` when unknown
    pub current_price: f64,
    /// Trailing P/E, `0` when unknown or earnings are non-positive
    pub price_to_earnings: f64,
    /// Dividend yield in percent (6.5 means 6.5%), `0` when unknown
    pub dividend_yield_pct: f64,
    /// Return on equity as a fraction (0.12 means 12%), `0` when unknown
    pub return_on_equity: f64,
}

impl IndicatorRecord {
    /// The record returned when the provider lookup fails.
    ///
    /// The ticker doubles as the company name, the sector is `"-"` and every
    /// numeric field is zero.
    pub fn fallback(ticker: &str) -> Self {
        let ticker = normalize_ticker(ticker);
        Self {
            company_name: ticker.clone(),
            ticker,
            sector: UNKNOWN_TEXT.to_string(),
            current_price: 0.0,
            price_to_earnings: 0.0,
            dividend_yield_pct: 0.0,
            return_on_equity: 0.0,
        }
    }

    /// Whether the provider supplied a usable price.
    pub fn has_price(&self) -> bool {
        self.current_price > 0.0
    }
}

/// A ranking candidate that passed the opportunity filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub record: IndicatorRecord,
    /// Opportunity score, rounded to 2 decimals
    pub score: f64,
}

/// Per-position analysis row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionAnalysis {
    pub position: PositionInput,
    pub indicators: IndicatorRecord,
    /// Yield on cost in percent; absent when the position has no average price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_on_cost_pct: Option<f64>,
    /// quantity * current price
    pub market_value: f64,
    /// Projected yearly dividends at the current yield
    pub annual_income: f64,
}

/// Scalar inputs for one growth simulation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationAssumptions {
    /// Capital invested at month zero
    pub initial_capital: f64,
    /// Fresh money added at the end of every month
    pub monthly_contribution: f64,
    /// Expected annual dividend yield in percent
    pub annual_yield_pct: f64,
}

impl Default for SimulationAssumptions {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            monthly_contribution: 2_000.0,
            annual_yield_pct: 8.0,
        }
    }
}

/// One simulated month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStep {
    /// 1-based month number
    pub month_index: u32,
    /// Dividend income produced during the month
    pub monthly_income: f64,
    /// Capital after reinvesting the income and adding the contribution
    pub capital_after_step: f64,
}

/// First month a milestone was reached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneCrossing {
    pub threshold_label: String,
    /// Monthly income target that was reached
    pub threshold: f64,
    pub month_reached: u32,
    /// month_reached / 12, rounded to 1 decimal
    pub years_reached: f64,
}

/// API response wrapper used by the command line front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
