//! Quote cache scoped to one refresh cycle.
//!
//! Memoizes `(ticker, date)` and `(ticker, date, contract)` lookups so a
//! portfolio with many legs on one underlying hits the provider once per
//! key. The cache borrows its provider and is dropped with the cycle; there
//! is no process-wide state. Errors are never cached.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use super::port::{ContractKey, MarketDataError, MarketDataProvider, OptionMark, UnderlyingSnapshot};

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups forwarded to the provider.
    pub misses: u64,
}

/// Memoizing wrapper around a [`MarketDataProvider`].
pub struct QuoteCache<'p, P: ?Sized> {
    provider: &'p P,
    underlyings: HashMap<(String, NaiveDate), UnderlyingSnapshot>,
    marks: HashMap<(String, NaiveDate, ContractKey), Option<OptionMark>>,
    stats: CacheStats,
}

impl<'p, P> QuoteCache<'p, P>
where
    P: MarketDataProvider + ?Sized,
{
    /// Create an empty cache over `provider`.
    #[must_use]
    pub fn new(provider: &'p P) -> Self {
        Self {
            provider,
            underlyings: HashMap::new(),
            marks: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Underlying snapshot, fetched at most once per key.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error; failed lookups are retried on the
    /// next call.
    pub async fn underlying(
        &mut self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<UnderlyingSnapshot, MarketDataError> {
        let key = (ticker.to_string(), as_of);
        if let Some(snapshot) = self.underlyings.get(&key) {
            self.stats.hits += 1;
            return Ok(snapshot.clone());
        }

        self.stats.misses += 1;
        debug!(ticker, %as_of, "Fetching underlying");
        let snapshot = self.provider.underlying(ticker, as_of).await?;
        self.underlyings.insert(key, snapshot.clone());
        Ok(snapshot)
    }

    /// Option mark, fetched at most once per key. Absent contracts are
    /// cached as `None`.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error.
    pub async fn option_mark(
        &mut self,
        ticker: &str,
        as_of: NaiveDate,
        contract: &ContractKey,
    ) -> Result<Option<OptionMark>, MarketDataError> {
        let key = (ticker.to_string(), as_of, contract.clone());
        if let Some(mark) = self.marks.get(&key) {
            self.stats.hits += 1;
            return Ok(mark.clone());
        }

        self.stats.misses += 1;
        let mark = self.provider.option_mark(ticker, as_of, contract).await?;
        self.marks.insert(key, mark.clone());
        Ok(mark)
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.underlyings.len() + self.marks.len()
    }

    /// Whether nothing has been cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
