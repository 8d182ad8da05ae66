//! Dividend opportunity ranking.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::market::IndicatorAggregator;
use crate::types::{round_dp, IndicatorRecord, ScoredCandidate};

/// Inclusion thresholds for the opportunity filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingCriteria {
    /// Minimum dividend yield in percent (inclusive)
    pub min_dividend_yield_pct: f64,
    /// Upper P/E bound (exclusive)
    pub max_price_to_earnings: f64,
}

impl Default for RankingCriteria {
    fn default() -> Self {
        Self {
            min_dividend_yield_pct: 6.0,
            max_price_to_earnings: 15.0,
        }
    }
}

impl RankingCriteria {
    /// Whether a record qualifies for scoring.
    ///
    /// A P/E of `0` means unknown and never qualifies.
    pub fn admits(&self, record: &IndicatorRecord) -> bool {
        record.dividend_yield_pct >= self.min_dividend_yield_pct
            && record.price_to_earnings > 0.0
            && record.price_to_earnings < self.max_price_to_earnings
    }
}

/// Opportunity score: `dividend_yield_pct + return_on_equity - price_to_earnings`,
/// rounded to 2 decimals.
///
/// The yield is in percent while ROE stays a fraction, so ROE only nudges
/// the score.
pub fn opportunity_score(record: &IndicatorRecord) -> f64 {
    round_dp(
        record.dividend_yield_pct + record.return_on_equity - record.price_to_earnings,
        2,
    )
}

/// Ranks candidate tickers by [`opportunity_score`].
#[derive(Debug, Clone, Default)]
pub struct OpportunityRanker {
    criteria: RankingCriteria,
}

impl OpportunityRanker {
    pub fn new(criteria: RankingCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &RankingCriteria {
        &self.criteria
    }

    /// Fetch every candidate through the aggregator and rank the ones that
    /// pass the filter, best first.
    ///
    /// Ties keep candidate order. Repeated tickers are ranked once.
    pub fn rank<S: AsRef<str> + Sync>(
        &self,
        aggregator: &IndicatorAggregator,
        candidates: &[S],
    ) -> Vec<ScoredCandidate> {
        let records = aggregator.fetch_many(candidates);
        let ranked = self.rank_records(records);
        tracing::debug!(
            "Ranked {} of {} candidates",
            ranked.len(),
            candidates.len()
        );
        ranked
    }

    /// Rank already-fetched records.
    pub fn rank_records<I>(&self, records: I) -> Vec<ScoredCandidate>
    where
        I: IntoIterator<Item = IndicatorRecord>,
    {
        let mut seen = HashSet::new();
        let mut scored: Vec<ScoredCandidate> = records
            .into_iter()
            .filter(|record| seen.insert(record.ticker.clone()))
            .filter(|record| self.criteria.admits(record))
            .map(|record| ScoredCandidate {
                score: opportunity_score(&record),
                record,
            })
            .collect();

        // sort_by is stable, so equal scores keep their input order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored
    }
}
