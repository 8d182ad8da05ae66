//! Indicator aggregation: fetch, normalize and memoize per-ticker records.

use rayon::prelude::*;
use rayon::ThreadPool;

use super::cache::SessionCache;
use super::provider::{MarketDataProvider, ProviderQuote};
use crate::types::{normalize_ticker, round_dp, IndicatorRecord, UNKNOWN_TEXT};

/// Normalize a raw provider quote into a total [`IndicatorRecord`].
///
/// Never fails. Absent or non-finite values take their sentinel defaults:
///
/// - company name and sector fall back to `"-"`
/// - price, P/E, dividend yield and ROE fall back to `0`
/// - the dividend yield fraction is scaled to percent and rounded to 2 decimals
/// - a non-positive P/E is stored as `0` (unknown)
/// - a negative price or yield is stored as `0`
pub fn normalize_quote(ticker: &str, quote: &ProviderQuote) -> IndicatorRecord {
    let text = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_TEXT)
            .to_string()
    };
    let number = |value: Option<f64>| value.filter(|v| v.is_finite()).unwrap_or(0.0);

    let dividend_yield_pct = round_dp(number(quote.dividend_yield) * 100.0, 2).max(0.0);
    let price_to_earnings = number(quote.trailing_pe);

    IndicatorRecord {
        ticker: normalize_ticker(ticker),
        company_name: text(&quote.company_name),
        sector: text(&quote.sector),
        current_price: number(quote.current_price).max(0.0),
        price_to_earnings: if price_to_earnings > 0.0 {
            price_to_earnings
        } else {
            0.0
        },
        dividend_yield_pct,
        return_on_equity: number(quote.return_on_equity),
    }
}

/// Fetches indicator records through an injected provider.
///
/// One aggregator is one analysis session: every ticker is looked up at most
/// once and later requests are served from the session cache.
pub struct IndicatorAggregator {
    provider: Box<dyn MarketDataProvider>,
    cache: SessionCache,
    concurrency: usize,
    // Private lookup pool, built once per aggregator (never the global pool)
    pool: Option<ThreadPool>,
}

impl IndicatorAggregator {
    /// Create an aggregator that performs lookups sequentially.
    pub fn new(provider: impl MarketDataProvider + 'static) -> Self {
        Self::from_boxed(Box::new(provider))
    }

    /// Create an aggregator over an already boxed provider.
    pub fn from_boxed(provider: Box<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            cache: SessionCache::new(),
            concurrency: 1,
            pool: None,
        }
    }

    /// Allow up to `limit` concurrent provider lookups in [`fetch_many`].
    ///
    /// A limit above one builds a private thread pool of that size, reused by
    /// every later call. If the pool cannot be built, lookups stay sequential.
    ///
    /// [`fetch_many`]: IndicatorAggregator::fetch_many
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        let limit = limit.max(1);
        self.pool = if limit > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(limit)
                .thread_name(|i| format!("indicator-fetch-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!("Falling back to sequential lookups: {}", e);
                    None
                }
            }
        } else {
            None
        };
        self.concurrency = if self.pool.is_some() { limit } else { 1 };
        self
    }

    /// Configured lookup concurrency.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The session cache.
    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Fetch the normalized record for a ticker.
    ///
    /// Provider failures are recovered into [`IndicatorRecord::fallback`].
    pub fn fetch(&self, ticker: &str) -> IndicatorRecord {
        let ticker = normalize_ticker(ticker);
        let (record, fetched) = self.cache.get_or_fetch(&ticker, || self.lookup(&ticker));
        if !fetched {
            tracing::trace!("Indicator cache hit: {}", ticker);
        }
        record
    }

    /// Fetch records for several tickers, preserving input order.
    ///
    /// With a concurrency limit above one, distinct tickers are looked up on
    /// the aggregator's private thread pool.
    pub fn fetch_many<S: AsRef<str> + Sync>(&self, tickers: &[S]) -> Vec<IndicatorRecord> {
        match &self.pool {
            Some(pool) if tickers.len() > 1 => pool.install(|| {
                tickers
                    .par_iter()
                    .map(|t| self.fetch(t.as_ref()))
                    .collect()
            }),
            _ => tickers.iter().map(|t| self.fetch(t.as_ref())).collect(),
        }
    }

    fn lookup(&self, ticker: &str) -> IndicatorRecord {
        tracing::debug!("Fetching indicators for {}", ticker);
        match self.provider.lookup(ticker) {
            Ok(quote) => normalize_quote(ticker, &quote),
            Err(e) => {
                tracing::warn!("Indicator lookup failed for {}: {}", ticker, e);
                IndicatorRecord::fallback(ticker)
            }
        }
    }
}

impl std::fmt::Debug for IndicatorAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorAggregator")
            .field("cached", &self.cache.len())
            .field("concurrency", &self.concurrency)
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::provider::ProviderError;
    use approx::assert_relative_eq;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    /// Provider stub that counts lookups per call.
    fn counting_provider(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn(&str) -> Result<ProviderQuote, ProviderError> + Send + Sync {
        move |ticker: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProviderQuote {
                company_name: Some(format!("{ticker} S.A.")),
                sector: Some("Financial Services".to_string()),
                current_price: Some(27.5),
                trailing_pe: Some(4.2),
                dividend_yield: Some(0.09134),
                return_on_equity: Some(0.21),
            })
        }
    }

    #[test]
    fn test_normalize_full_quote() {
        let quote = ProviderQuote {
            company_name: Some("Banco do Brasil S.A.".to_string()),
            sector: Some("Financial Services".to_string()),
            current_price: Some(27.9),
            trailing_pe: Some(4.1),
            dividend_yield: Some(0.09137),
            return_on_equity: Some(0.2),
        };
        let record = normalize_quote("bbas3", &quote);

        assert_eq!(record.ticker, "BBAS3");
        assert_eq!(record.company_name, "Banco do Brasil S.A.");
        assert_eq!(record.sector, "Financial Services");
        assert_eq!(record.current_price, 27.9);
        assert_eq!(record.price_to_earnings, 4.1);
        assert_relative_eq!(record.dividend_yield_pct, 9.14);
        assert_eq!(record.return_on_equity, 0.2);
    }

    #[test]
    fn test_normalize_missing_fields() {
        let record = normalize_quote("RZTR11", &ProviderQuote::default());

        assert_eq!(record.company_name, "-");
        assert_eq!(record.sector, "-");
        assert_eq!(record.current_price, 0.0);
        assert_eq!(record.price_to_earnings, 0.0);
        assert_eq!(record.dividend_yield_pct, 0.0);
        assert_eq!(record.return_on_equity, 0.0);
    }

    #[test]
    fn test_normalize_sentinels() {
        let quote = ProviderQuote {
            current_price: Some(f64::NAN),
            trailing_pe: Some(-12.0),
            return_on_equity: Some(-0.15),
            ..Default::default()
        };
        let record = normalize_quote("HAPV3", &quote);

        assert_eq!(record.current_price, 0.0);
        assert_eq!(record.price_to_earnings, 0.0);
        assert_eq!(record.return_on_equity, -0.15);
    }

    #[test]
    fn test_fetch_failure_returns_fallback() {
        let aggregator = IndicatorAggregator::new(|_: &str| -> Result<ProviderQuote, ProviderError> {
            Err(ProviderError::Timeout)
        });

        let record = aggregator.fetch("JHSF3");
        assert_eq!(record, IndicatorRecord::fallback("JHSF3"));
        assert_eq!(record.company_name, "JHSF3");
    }

    #[test]
    fn test_fetch_is_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = IndicatorAggregator::new(counting_provider(Arc::clone(&calls)));

        let first = aggregator.fetch("BBAS3");
        let second = aggregator.fetch("bbas3");

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(aggregator.cache().len(), 1);
    }

    #[test]
    fn test_failed_fetch_is_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let aggregator = IndicatorAggregator::new(move |_: &str| -> Result<ProviderQuote, ProviderError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Unavailable("down".to_string()))
        });

        aggregator.fetch("VALE3");
        aggregator.fetch("VALE3");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fetch_many_preserves_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator =
            IndicatorAggregator::new(counting_provider(Arc::clone(&calls))).with_concurrency(4);

        let tickers = ["VALE3", "BBAS3", "KLBN4", "BBAS3", "TAEE11"];
        let records = aggregator.fetch_many(&tickers);

        let order: Vec<_> = records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["VALE3", "BBAS3", "KLBN4", "BBAS3", "TAEE11"]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_concurrent_fetches_coalesce() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let aggregator = Arc::new(IndicatorAggregator::new(
            move |ticker: &str| -> Result<ProviderQuote, ProviderError> {
                counter.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(50));
                Ok(ProviderQuote {
                    company_name: Some(ticker.to_string()),
                    current_price: Some(10.0),
                    ..Default::default()
                })
            },
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let aggregator = Arc::clone(&aggregator);
                thread::spawn(move || aggregator.fetch("ITSA4"))
            })
            .collect();

        for handle in handles {
            let record = handle.join().unwrap();
            assert_eq!(record.current_price, 10.0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fetch_many_reuses_private_pool() {
        let threads = Arc::new(Mutex::new(HashSet::new()));
        let seen = Arc::clone(&threads);
        let aggregator = IndicatorAggregator::new(move |_: &str| -> Result<ProviderQuote, ProviderError> {
            let name = thread::current().name().map(str::to_string);
            seen.lock().unwrap().insert(name);
            thread::sleep(Duration::from_millis(5));
            Ok(ProviderQuote::default())
        })
        .with_concurrency(2);

        aggregator.fetch_many(&["BBAS3", "BBSE3", "CMIG4", "CPLE6"]);
        aggregator.fetch_many(&["ITSA4", "KLBN4", "PETR4", "SANB11"]);

        let threads = threads.lock().unwrap();
        assert!(!threads.is_empty() && threads.len() <= 2);
        for name in threads.iter() {
            let name = name.as_deref().unwrap_or_default();
            assert!(
                name == "indicator-fetch-0" || name == "indicator-fetch-1",
                "unexpected lookup thread {name}"
            );
        }
    }

    #[test]
    fn test_sequential_aggregator_has_no_pool() {
        let aggregator = IndicatorAggregator::new(|_: &str| -> Result<ProviderQuote, ProviderError> {
            Ok(ProviderQuote::default())
        })
        .with_concurrency(0);

        assert_eq!(aggregator.concurrency(), 1);
        assert!(aggregator.pool.is_none());
    }
}
