//! Market data access for refreshing leg Greeks.
//!
//! - [`MarketDataProvider`]: async port implemented by the caller
//! - [`QuoteCache`]: per-cycle memoization over a provider
//! - [`LegGreeksRefresher`]: fills leg Greeks and marks P&L ahead of a
//!   pipeline run
//!
//! The risk pipeline is synchronous and never touches this module; a
//! refresh cycle is `refresh_portfolio` followed by
//! [`PortfolioMetricsEngine::run`](crate::engine::PortfolioMetricsEngine::run).

mod cache;
mod port;
mod refresh;

pub use cache::{CacheStats, QuoteCache};
pub use port::{ContractKey, MarketDataError, MarketDataProvider, OptionMark, UnderlyingSnapshot};
pub use refresh::{GreeksSource, LegGreeksRefresher, PortfolioRefresh, RefreshSummary};
