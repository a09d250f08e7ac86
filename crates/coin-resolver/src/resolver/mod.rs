//! Resolvers
//!
//! Each resolver turns one kind of reference into a `CoinQuote` and
//! returns `None` on any failure. Errors stay inside the resolver and are
//! only logged.

pub mod aggregator;
pub mod contract;
pub mod dex;
pub mod extraction;
pub mod page;
pub mod web_search;

pub use aggregator::AggregatorResolver;
pub use contract::ContractResolver;
pub use dex::DexResolver;
pub use extraction::ExtractionResolver;
pub use web_search::WebSearchResolver;
