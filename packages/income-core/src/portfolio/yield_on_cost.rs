//! Yield-on-cost calculation.

use crate::types::{round_dp, IndicatorRecord};
use crate::{Error, Result};

/// Dividend yield relative to the investor's average purchase price.
///
/// `(dividend_yield_pct * current_price) / average_price`, rounded to 2
/// decimals. An unknown price (`0`) yields `0`.
///
/// # Errors
///
/// Returns [`Error::InvalidDivisor`] unless `average_price` is positive and
/// finite.
///
/// # Example
///
/// ```rust
/// use income_core::{portfolio::yield_on_cost, IndicatorRecord};
///
/// let record = IndicatorRecord {
///     current_price: 50.0,
///     dividend_yield_pct: 5.0,
///     ..IndicatorRecord::fallback("TAEE11")
/// };
/// assert_eq!(yield_on_cost(&record, 40.0).unwrap(), 6.25);
/// ```
pub fn yield_on_cost(record: &IndicatorRecord, average_price: f64) -> Result<f64> {
    if !(average_price.is_finite() && average_price > 0.0) {
        return Err(Error::InvalidDivisor(average_price));
    }

    if record.current_price == 0.0 {
        return Ok(0.0);
    }

    Ok(round_dp(
        record.dividend_yield_pct * record.current_price / average_price,
        2,
    ))
}
