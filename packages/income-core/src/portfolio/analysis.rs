//! Portfolio analysis: per-position indicators, yield on cost and income totals.

use serde::{Deserialize, Serialize};

use super::yield_on_cost::yield_on_cost;
use crate::market::IndicatorAggregator;
use crate::types::{round_dp, PositionAnalysis, PositionInput};
use crate::Result;

/// Analyze every position against its indicator record.
///
/// Records are fetched through the session aggregator, so tickers already
/// seen by the ranking engine are not looked up again.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidDivisor`] if a position carries a
/// non-positive average price.
pub fn analyze_positions(
    aggregator: &IndicatorAggregator,
    positions: &[PositionInput],
) -> Result<Vec<PositionAnalysis>> {
    let tickers: Vec<&str> = positions.iter().map(|p| p.ticker.as_str()).collect();
    let records = aggregator.fetch_many(&tickers);

    positions
        .iter()
        .zip(records)
        .map(|(position, indicators)| -> Result<PositionAnalysis> {
            let yield_on_cost_pct = position
                .average_price
                .map(|price| yield_on_cost(&indicators, price))
                .transpose()?;
            let market_value = position.quantity * indicators.current_price;
            let annual_income = market_value * indicators.dividend_yield_pct / 100.0;

            Ok(PositionAnalysis {
                position: position.clone(),
                indicators,
                yield_on_cost_pct,
                market_value,
                annual_income,
            })
        })
        .collect()
}

/// Portfolio-level income summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    /// Number of positions
    pub position_count: usize,
    /// Positions whose price is unknown
    pub positions_without_price: usize,
    /// Sum of market values
    pub total_market_value: f64,
    /// Sum of cost for positions with an average price
    pub total_cost: f64,
    /// Projected yearly dividend income
    pub annual_income: f64,
    /// annual_income / 12
    pub monthly_income: f64,
    /// annual_income as a percentage of market value
    pub portfolio_yield_pct: f64,
    /// Income of positions with a known cost, as a percentage of that cost
    pub yield_on_cost_pct: f64,
}

impl PortfolioSummary {
    /// Aggregate analysis rows. Money values are rounded to 2 decimals.
    pub fn from_analyses(rows: &[PositionAnalysis]) -> Self {
        let total_market_value: f64 = rows.iter().map(|r| r.market_value).sum();
        let annual_income: f64 = rows.iter().map(|r| r.annual_income).sum();

        let (total_cost, income_on_cost) = rows
            .iter()
            .filter_map(|r| r.position.total_cost().map(|cost| (cost, r.annual_income)))
            .fold((0.0, 0.0), |(cost, income), (c, i)| (cost + c, income + i));

        let portfolio_yield_pct = if total_market_value > 0.0 {
            annual_income / total_market_value * 100.0
        } else {
            0.0
        };
        let yield_on_cost_pct = if total_cost > 0.0 {
            income_on_cost / total_cost * 100.0
        } else {
            0.0
        };

        Self {
            position_count: rows.len(),
            positions_without_price: rows.iter().filter(|r| !r.indicators.has_price()).count(),
            total_market_value: round_dp(total_market_value, 2),
            total_cost: round_dp(total_cost, 2),
            annual_income: round_dp(annual_income, 2),
            monthly_income: round_dp(annual_income / 12.0, 2),
            portfolio_yield_pct: round_dp(portfolio_yield_pct, 2),
            yield_on_cost_pct: round_dp(yield_on_cost_pct, 2),
        }
    }
}
