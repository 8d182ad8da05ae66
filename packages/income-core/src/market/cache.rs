//! Per-session indicator cache with request coalescing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::types::IndicatorRecord;

type Slot = Arc<OnceLock<IndicatorRecord>>;

/// Memoizes one [`IndicatorRecord`] per ticker for the lifetime of a session.
///
/// Each ticker owns a once-cell. The first caller initializes it; callers that
/// arrive while that fetch is in flight block on the same cell instead of
/// issuing their own. Once filled an entry is never replaced.
#[derive(Debug, Default)]
pub struct SessionCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // A panic inside a fetch never happens while this lock is held.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached record for `ticker`, running `fetch` only if no
    /// record exists and no other caller is already fetching it.
    ///
    /// The returned flag is true when this call ran `fetch`.
    pub fn get_or_fetch<F>(&self, ticker: &str, fetch: F) -> (IndicatorRecord, bool)
    where
        F: FnOnce() -> IndicatorRecord,
    {
        let slot = Arc::clone(self.slots().entry(ticker.to_string()).or_default());

        let mut fetched = false;
        let record = slot.get_or_init(|| {
            fetched = true;
            fetch()
        });
        (record.clone(), fetched)
    }

    /// Cached record for `ticker`, if already fetched.
    pub fn get(&self, ticker: &str) -> Option<IndicatorRecord> {
        self.slots()
            .get(ticker)
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of tickers with a completed record.
    pub fn len(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All completed records, sorted by ticker.
    pub fn snapshot(&self) -> Vec<IndicatorRecord> {
        let mut records: Vec<IndicatorRecord> = self
            .slots()
            .values()
            .filter_map(|slot| slot.get().cloned())
            .collect();
        records.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_writer_wins() {
        let cache = SessionCache::new();

        let (first, fetched) = cache.get_or_fetch("BBAS3", || IndicatorRecord::fallback("BBAS3"));
        assert!(fetched);
        assert_eq!(first.company_name, "BBAS3");

        let (second, fetched) = cache.get_or_fetch("BBAS3", || {
            let mut other = IndicatorRecord::fallback("BBAS3");
            other.company_name = "Replaced".to_string();
            other
        });
        assert!(!fetched);
        assert_eq!(second.company_name, "BBAS3");
    }

    #[test]
    fn test_get_and_len() {
        let cache = SessionCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("VALE3").is_none());

        cache.get_or_fetch("VALE3", || IndicatorRecord::fallback("VALE3"));
        cache.get_or_fetch("KLBN4", || IndicatorRecord::fallback("KLBN4"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("VALE3").is_some());
        let tickers: Vec<_> = cache.snapshot().into_iter().map(|r| r.ticker).collect();
        assert_eq!(tickers, vec!["KLBN4", "VALE3"]);
    }
}
