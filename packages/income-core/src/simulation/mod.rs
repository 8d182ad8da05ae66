//! Passive-income growth simulation.
//!
//! Projects how reinvested dividends plus a fixed monthly contribution grow
//! toward monthly-income milestones.

mod engine;
mod milestones;

pub use engine::{GrowthSimulator, SimulationOutcome, DEFAULT_MAX_MONTHS};
pub use milestones::{Milestone, MilestoneSet, DEFAULT_THRESHOLDS};
