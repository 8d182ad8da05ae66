//! Market indicator layer.
//!
//! Turns raw, unreliable provider data into total [`IndicatorRecord`]s and
//! memoizes them per analysis session.
//!
//! [`IndicatorRecord`]: crate::types::IndicatorRecord

mod aggregator;
mod cache;
mod provider;

pub use aggregator::{normalize_quote, IndicatorAggregator};
pub use cache::SessionCache;
pub use provider::{
    MarketDataProvider, OfflineProvider, ProviderError, ProviderQuote, QuoteFileProvider,
};
