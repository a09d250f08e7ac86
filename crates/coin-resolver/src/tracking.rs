//! Search Tracking
//!
//! Counts how often each coin is successfully resolved so a "trending"
//! list can be served. Recording is fire-and-forget: it runs on its own
//! task and its outcome never reaches the resolver that triggered it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};
use crate::model::CoinQuote;

/// A coin with its search count
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchedCoin {
    pub name: String,
    pub symbol: String,
    pub count: u64,
    pub last_searched_at: DateTime<Utc>,
}

/// External analytics collaborator
#[async_trait]
pub trait SearchTracker: Send + Sync {
    /// Record one successful lookup of `name`
    async fn record(&self, name: &str, symbol: &str) -> Result<()>;

    /// Most-searched coins, highest count first
    async fn trending(&self, limit: usize) -> Result<Vec<SearchedCoin>>;
}

/// Report a resolved quote without waiting for the tracker
pub fn notify_search(tracker: &Arc<dyn SearchTracker>, quote: &CoinQuote) {
    let tracker = Arc::clone(tracker);
    let name = quote.name.clone();
    let symbol = quote.symbol.clone();

    tokio::spawn(async move {
        if let Err(e) = tracker.record(&name, &symbol).await {
            tracing::warn!(coin = %name, error = %e, "failed to record coin search");
        }
    });
}

/// In-process tracker keyed by coin name
#[derive(Default)]
pub struct MemorySearchTracker {
    coins: Mutex<HashMap<String, SearchedCoin>>,
}

impl MemorySearchTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchTracker for MemorySearchTracker {
    async fn record(&self, name: &str, symbol: &str) -> Result<()> {
        let mut coins = self
            .coins
            .lock()
            .map_err(|_| ResolveError::Config("search tracker lock poisoned".into()))?;

        let now = Utc::now();
        coins
            .entry(name.to_string())
            .and_modify(|coin| {
                coin.count += 1;
                coin.last_searched_at = now;
            })
            .or_insert_with(|| SearchedCoin {
                name: name.to_string(),
                symbol: symbol.to_uppercase(),
                count: 1,
                last_searched_at: now,
            });
        Ok(())
    }

    async fn trending(&self, limit: usize) -> Result<Vec<SearchedCoin>> {
        let coins = self
            .coins
            .lock()
            .map_err(|_| ResolveError::Config("search tracker lock poisoned".into()))?;

        let mut list: Vec<SearchedCoin> = coins.values().cloned().collect();
        list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        list.truncate(limit);
        Ok(list)
    }
}
