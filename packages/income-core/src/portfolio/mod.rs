//! Portfolio module.
//!
//! Position tracking, per-position yield on cost and income summaries.

mod analysis;
mod tracker;
mod yield_on_cost;

pub use analysis::{analyze_positions, PortfolioSummary};
pub use tracker::{default_portfolio, PortfolioTracker, DEFAULT_HOLDINGS};
pub use yield_on_cost::yield_on_cost;
