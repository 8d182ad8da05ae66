//! Passive-income milestone configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Canonical monthly-income targets.
pub const DEFAULT_THRESHOLDS: [f64; 3] = [100.0, 1_000.0, 10_000.0];

/// A monthly-income target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    /// Monthly income to reach
    pub threshold: f64,
    /// Display label
    pub label: String,
}

impl Milestone {
    /// Milestone labelled `"<threshold>/month"`.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            label: format!("{threshold}/month"),
        }
    }

    pub fn with_label(threshold: f64, label: impl Into<String>) -> Self {
        Self {
            threshold,
            label: label.into(),
        }
    }
}

/// Validated milestone list: non-empty, positive, distinct, ascending.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct MilestoneSet {
    milestones: Vec<Milestone>,
}

impl MilestoneSet {
    /// Validate and sort `milestones`.
    pub fn new(mut milestones: Vec<Milestone>) -> Result<Self> {
        if milestones.is_empty() {
            return Err(Error::InvalidAssumption(
                "at least one milestone is required".to_string(),
            ));
        }
        if let Some(bad) = milestones
            .iter()
            .find(|m| !(m.threshold.is_finite() && m.threshold > 0.0))
        {
            return Err(Error::InvalidAssumption(format!(
                "milestone threshold must be positive, got {}",
                bad.threshold
            )));
        }

        milestones.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        milestones.dedup_by(|a, b| a.threshold == b.threshold);
        Ok(Self { milestones })
    }

    /// Milestones for the given thresholds with default labels.
    pub fn from_thresholds(thresholds: &[f64]) -> Result<Self> {
        Self::new(thresholds.iter().copied().map(Milestone::new).collect())
    }

    /// The ascending milestones.
    pub fn iter(&self) -> std::slice::Iter<'_, Milestone> {
        self.milestones.iter()
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }

    /// The largest threshold; reaching it ends a simulation.
    pub fn top(&self) -> f64 {
        self.milestones
            .last()
            .map(|m| m.threshold)
            .unwrap_or(f64::INFINITY)
    }
}

impl Default for MilestoneSet {
    fn default() -> Self {
        Self {
            milestones: DEFAULT_THRESHOLDS.iter().copied().map(Milestone::new).collect(),
        }
    }
}

impl<'de> Deserialize<'de> for MilestoneSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let milestones = Vec::<Milestone>::deserialize(deserializer)?;
        Self::new(milestones).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a MilestoneSet {
    type Item = &'a Milestone;
    type IntoIter = std::slice::Iter<'a, Milestone>;

    fn into_iter(self) -> Self::IntoIter {
        self.milestones.iter()
    }
}
