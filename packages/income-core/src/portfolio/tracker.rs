//! Portfolio position tracking and persistence.

use crate::types::{normalize_ticker, PositionInput};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Holdings used when no portfolio file exists yet.
pub const DEFAULT_HOLDINGS: &[(&str, f64)] = &[
    ("BBAS3", 100.0),
    ("HAPV3", 200.0),
    ("JHSF3", 500.0),
    ("KLBN4", 220.0),
    ("VALE3", 50.0),
    ("RBRR11", 1.0),
    ("RZTR11", 12.0),
];

/// The built-in starter portfolio.
pub fn default_portfolio() -> Vec<PositionInput> {
    DEFAULT_HOLDINGS
        .iter()
        .map(|(ticker, quantity)| PositionInput::new(ticker, *quantity))
        .collect()
}

/// On-disk portfolio document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioFile {
    positions: Vec<PositionInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// Portfolio tracker that manages positions and persists them to JSON.
#[derive(Debug)]
pub struct PortfolioTracker {
    /// Path to the portfolio JSON file
    path: PathBuf,
    positions: Vec<PositionInput>,
    updated_at: Option<DateTime<Utc>>,
}

impl PortfolioTracker {
    /// Create a tracker at the default path.
    ///
    /// Default path: `~/.income-core/portfolio.json`
    /// Can be overridden with the `INCOME_PORTFOLIO_FILE` environment variable.
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_path())
    }

    /// Create a tracker backed by `path`.
    ///
    /// A missing file starts from [`default_portfolio`].
    pub fn with_path(path: PathBuf) -> Result<Self> {
        let file = Self::load_from_path(&path)?;
        Ok(Self {
            path,
            positions: file.positions,
            updated_at: file.updated_at,
        })
    }

    /// Create an in-memory tracker (no persistence) holding `positions`.
    pub fn in_memory(positions: Vec<PositionInput>) -> Self {
        Self {
            path: PathBuf::new(),
            positions,
            updated_at: None,
        }
    }

    /// Get the default portfolio file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("INCOME_PORTFOLIO_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".income-core/portfolio.json"))
            .unwrap_or_else(|| PathBuf::from("portfolio.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_path(path: &Path) -> Result<PortfolioFile> {
        if !path.exists() {
            tracing::debug!("No portfolio at {}, using defaults", path.display());
            return Ok(PortfolioFile {
                positions: default_portfolio(),
                updated_at: None,
            });
        }

        let content = fs::read_to_string(path)?;
        let data: serde_json::Value = serde_json::from_str(&content)?;

        // A bare list of positions is accepted as well
        let mut file: PortfolioFile = if data.is_array() {
            PortfolioFile {
                positions: serde_json::from_value(data)?,
                updated_at: None,
            }
        } else {
            serde_json::from_value(data)?
        };

        for position in &mut file.positions {
            position.ticker = normalize_ticker(&position.ticker);
            validate_position(position)?;
        }
        Ok(file)
    }

    /// Save the current positions to disk.
    pub fn save(&mut self) -> Result<()> {
        // Skip if in-memory only
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.updated_at = Some(Utc::now());
        let file = PortfolioFile {
            positions: self.positions.clone(),
            updated_at: self.updated_at,
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        tracing::info!("Saved {} positions to {}", self.positions.len(), self.path.display());
        Ok(())
    }

    /// All positions, in insertion order.
    pub fn positions(&self) -> &[PositionInput] {
        &self.positions
    }

    /// When the portfolio file was last written.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Find a position by ticker.
    pub fn find_position(&self, ticker: &str) -> Option<&PositionInput> {
        let ticker = normalize_ticker(ticker);
        self.positions.iter().find(|p| p.ticker == ticker)
    }

    /// Add or top up a position.
    ///
    /// An existing position is merged: quantities add up and, when both sides
    /// carry a price, the average price is re-weighted:
    /// `(old_qty * old_avg + qty * avg) / (old_qty + qty)`.
    /// Topping up a priced position requires a price for the new units.
    ///
    /// Returns the resulting position and whether it was an update.
    pub fn add_position(
        &mut self,
        ticker: &str,
        quantity: f64,
        average_price: Option<f64>,
    ) -> Result<(PositionInput, bool)> {
        let mut incoming = PositionInput::new(ticker, quantity);
        incoming.average_price = average_price;
        validate_position(&incoming)?;

        if let Some(idx) = self
            .positions
            .iter()
            .position(|p| p.ticker == incoming.ticker)
        {
            let existing = &mut self.positions[idx];
            if existing.average_price.is_some() && incoming.average_price.is_none() {
                return Err(Error::InvalidOperation(format!(
                    "{}: a price is required to top up a position with a known average price",
                    existing.ticker
                )));
            }
            let total = existing.quantity + incoming.quantity;
            existing.average_price = match (existing.average_price, incoming.average_price) {
                (Some(old), Some(new)) if total > 0.0 => {
                    Some((existing.quantity * old + incoming.quantity * new) / total)
                }
                (old, new) => new.or(old),
            };
            existing.quantity = total;
            Ok((existing.clone(), true))
        } else {
            self.positions.push(incoming.clone());
            Ok((incoming, false))
        }
    }

    /// Remove a position, returning it.
    pub fn remove_position(&mut self, ticker: &str) -> Result<PositionInput> {
        let ticker = normalize_ticker(ticker);
        match self.positions.iter().position(|p| p.ticker == ticker) {
            Some(idx) => Ok(self.positions.remove(idx)),
            None => Err(Error::PositionNotFound(ticker)),
        }
    }
}

fn validate_position(position: &PositionInput) -> Result<()> {
    if position.ticker.is_empty() {
        return Err(Error::InvalidOperation("ticker must not be empty".to_string()));
    }
    if !(position.quantity.is_finite() && position.quantity >= 0.0) {
        return Err(Error::InvalidOperation(format!(
            "{}: quantity must be a non-negative number, got {}",
            position.ticker, position.quantity
        )));
    }
    if let Some(price) = position.average_price {
        if !(price.is_finite() && price > 0.0) {
            return Err(Error::InvalidOperation(format!(
                "{}: average price must be a positive number, got {}",
                position.ticker, price
            )));
        }
    }
    Ok(())
}
