//! Compounding growth simulation toward monthly-income milestones.

use serde::{Deserialize, Serialize};

use super::milestones::MilestoneSet;
use crate::types::{round_dp, MilestoneCrossing, SimulationAssumptions, SimulationStep};
use crate::{Error, Result};

/// Iteration cap: 100 years of monthly steps.
pub const DEFAULT_MAX_MONTHS: u32 = 1_200;

impl SimulationAssumptions {
    /// Check that every input is a finite, non-negative number.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("initial capital", self.initial_capital),
            ("monthly contribution", self.monthly_contribution),
            ("annual yield", self.annual_yield_pct),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidAssumption(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Monthly dividend rate as a fraction.
    pub fn monthly_rate(&self) -> f64 {
        self.annual_yield_pct / 100.0 / 12.0
    }
}

/// Result of a completed simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutcome {
    /// One entry per simulated month
    pub steps: Vec<SimulationStep>,
    /// Milestones in the order they were first reached
    pub crossings: Vec<MilestoneCrossing>,
}

impl SimulationOutcome {
    /// Number of simulated months.
    pub fn months(&self) -> u32 {
        self.steps.last().map(|s| s.month_index).unwrap_or(0)
    }

    /// Capital at the end of the last month.
    pub fn final_capital(&self) -> Option<f64> {
        self.steps.last().map(|s| s.capital_after_step)
    }

    /// Capital series for charting.
    pub fn capital_trajectory(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.capital_after_step).collect()
    }
}

/// Month-by-month dividend reinvestment simulator.
///
/// Each month produces `capital * annual_yield / 12` of income, records any
/// milestone reached for the first time, then reinvests the income together
/// with the monthly contribution. The run stops in the month the income first
/// reaches the top milestone.
///
/// # Example
///
/// ```rust
/// use income_core::{GrowthSimulator, SimulationAssumptions};
///
/// let outcome = GrowthSimulator::default()
///     .run(&SimulationAssumptions::default())
///     .unwrap();
/// assert_eq!(outcome.crossings.len(), 3);
/// assert!(outcome.steps.last().unwrap().monthly_income >= 10_000.0);
/// ```
#[derive(Debug, Clone)]
pub struct GrowthSimulator {
    milestones: MilestoneSet,
    max_months: u32,
}

impl Default for GrowthSimulator {
    fn default() -> Self {
        Self::new(MilestoneSet::default())
    }
}

impl GrowthSimulator {
    pub fn new(milestones: MilestoneSet) -> Self {
        Self {
            milestones,
            max_months: DEFAULT_MAX_MONTHS,
        }
    }

    /// Override the iteration cap.
    pub fn with_max_months(mut self, max_months: u32) -> Self {
        self.max_months = max_months;
        self
    }

    pub fn milestones(&self) -> &MilestoneSet {
        &self.milestones
    }

    pub fn max_months(&self) -> u32 {
        self.max_months
    }

    /// Run the simulation.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAssumption`] for negative or non-finite inputs.
    /// - [`Error::NonProgress`] when income can never grow (zero yield, or
    ///   zero capital with zero contribution).
    /// - [`Error::MilestoneNotReached`] when the top milestone is not reached
    ///   within the iteration cap.
    pub fn run(&self, assumptions: &SimulationAssumptions) -> Result<SimulationOutcome> {
        assumptions.validate()?;

        let rate = assumptions.monthly_rate();
        let target = self.milestones.top();

        let stalled = rate == 0.0
            || (assumptions.initial_capital == 0.0 && assumptions.monthly_contribution == 0.0);
        if stalled {
            tracing::warn!(
                "Income cannot grow: yield {}%, capital {}, contribution {}",
                assumptions.annual_yield_pct,
                assumptions.initial_capital,
                assumptions.monthly_contribution
            );
            return Err(Error::NonProgress {
                months: 0,
                monthly_income: 0.0,
            });
        }

        let mut capital = assumptions.initial_capital;
        let mut month: u32 = 0;
        let mut steps: Vec<SimulationStep> = Vec::new();
        let mut crossings: Vec<MilestoneCrossing> = Vec::new();
        let mut next_milestone = 0;

        loop {
            if month >= self.max_months {
                let monthly_income = steps.last().map_or(0.0, |s| s.monthly_income);
                tracing::warn!(
                    "Stopped after {} months at {:.2}/month, target {}",
                    month,
                    monthly_income,
                    target
                );
                return Err(Error::MilestoneNotReached {
                    max_months: self.max_months,
                    monthly_income,
                });
            }

            let monthly_income = capital * rate;
            month += 1;

            // Milestones are ascending, so crossed ones form a prefix.
            for milestone in self.milestones.iter().skip(next_milestone) {
                if monthly_income < milestone.threshold {
                    break;
                }
                crossings.push(MilestoneCrossing {
                    threshold_label: milestone.label.clone(),
                    threshold: milestone.threshold,
                    month_reached: month,
                    years_reached: round_dp(f64::from(month) / 12.0, 1),
                });
                next_milestone += 1;
            }

            capital += monthly_income + assumptions.monthly_contribution;
            steps.push(SimulationStep {
                month_index: month,
                monthly_income,
                capital_after_step: capital,
            });

            if monthly_income >= target {
                break;
            }
        }

        tracing::debug!(
            "Simulation reached {}/month after {} months",
            target,
            month
        );
        Ok(SimulationOutcome { steps, crossings })
    }
}
