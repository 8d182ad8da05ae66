//! Market-data provider seam.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::types::normalize_ticker;

/// Raw quote fields as returned by a market-data provider.
///
/// Field names follow the provider's payload so snapshots can be stored and
/// replayed verbatim. Every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderQuote {
    #[serde(rename = "longName", default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(rename = "currentPrice", default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(rename = "trailingPE", default, skip_serializing_if = "Option::is_none")]
    pub trailing_pe: Option<f64>,
    /// Dividend yield as a fraction (0.065 means 6.5%)
    #[serde(rename = "dividendYield", default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
    /// Return on equity as a fraction
    #[serde(rename = "returnOnEquity", default, skip_serializing_if = "Option::is_none")]
    pub return_on_equity: Option<f64>,
}

/// Errors a provider lookup may raise.
///
/// These never leave the aggregator; they are recovered into fallback records.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("lookup timed out")]
    Timeout,
}

/// Source of raw quotes for a ticker.
///
/// Implementations must be shareable across the aggregator's worker threads.
pub trait MarketDataProvider: Send + Sync {
    fn lookup(&self, ticker: &str) -> Result<ProviderQuote, ProviderError>;
}

impl<F> MarketDataProvider for F
where
    F: Fn(&str) -> Result<ProviderQuote, ProviderError> + Send + Sync,
{
    fn lookup(&self, ticker: &str) -> Result<ProviderQuote, ProviderError> {
        self(ticker)
    }
}

/// Provider with no data source; every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

impl MarketDataProvider for OfflineProvider {
    fn lookup(&self, _ticker: &str) -> Result<ProviderQuote, ProviderError> {
        Err(ProviderError::Unavailable("no market data source configured".to_string()))
    }
}

/// Provider backed by a JSON snapshot of quotes keyed by ticker.
///
/// ```json
/// { "BBAS3": { "longName": "Banco do Brasil S.A.", "currentPrice": 27.9,
///              "trailingPE": 4.1, "dividendYield": 0.091 } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuoteFileProvider {
    quotes: HashMap<String, ProviderQuote>,
}

impl QuoteFileProvider {
    /// Build a provider from in-memory quotes.
    pub fn from_quotes(quotes: HashMap<String, ProviderQuote>) -> Self {
        let quotes = quotes
            .into_iter()
            .map(|(ticker, quote)| (normalize_ticker(&ticker), quote))
            .collect();
        Self { quotes }
    }

    /// Load a snapshot file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = fs::read_to_string(path)?;
        let quotes: HashMap<String, ProviderQuote> = serde_json::from_str(&content)?;
        tracing::debug!("Loaded {} quotes from {}", quotes.len(), path.display());
        Ok(Self::from_quotes(quotes))
    }

    /// Number of tickers in the snapshot.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl MarketDataProvider for QuoteFileProvider {
    fn lookup(&self, ticker: &str) -> Result<ProviderQuote, ProviderError> {
        self.quotes
            .get(&normalize_ticker(ticker))
            .cloned()
            .ok_or_else(|| ProviderError::UnknownTicker(ticker.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_quote_deserializes_provider_names() {
        let quote: ProviderQuote = serde_json::from_str(
            r#"{"longName":"Vale S.A.","currentPrice":61.2,"trailingPE":7.5,"dividendYield":0.083}"#,
        )
        .unwrap();
        assert_eq!(quote.company_name.as_deref(), Some("Vale S.A."));
        assert_eq!(quote.current_price, Some(61.2));
        assert_eq!(quote.trailing_pe, Some(7.5));
        assert_eq!(quote.dividend_yield, Some(0.083));
        assert!(quote.sector.is_none());
        assert!(quote.return_on_equity.is_none());
    }

    #[test]
    fn test_offline_provider_fails() {
        assert!(OfflineProvider.lookup("BBAS3").is_err());
    }

    #[test]
    fn test_closure_provider() {
        let provider = |ticker: &str| -> Result<ProviderQuote, ProviderError> {
            Ok(ProviderQuote {
                company_name: Some(format!("{ticker} Corp")),
                ..Default::default()
            })
        };
        let quote = provider.lookup("KLBN4").unwrap();
        assert_eq!(quote.company_name.as_deref(), Some("KLBN4 Corp"));
    }

    #[test]
    fn test_quote_file_provider() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        fs::write(
            &path,
            r#"{"bbas3":{"longName":"Banco do Brasil S.A.","currentPrice":27.9}}"#,
        )
        .unwrap();

        let provider = QuoteFileProvider::load(&path).unwrap();
        assert_eq!(provider.len(), 1);
        let quote = provider.lookup("BBAS3").unwrap();
        assert_eq!(quote.current_price, Some(27.9));
        assert!(matches!(
            provider.lookup("ITSA4"),
            Err(ProviderError::UnknownTicker(_))
        ));
    }

    #[test]
    fn test_quote_file_provider_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            QuoteFileProvider::load(&path),
            Err(crate::Error::Json(_))
        ));
    }
}
