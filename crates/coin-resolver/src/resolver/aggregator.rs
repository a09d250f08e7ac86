//! Aggregator-API Resolver
//!
//! Free-text name/symbol lookup against the price aggregator: search,
//! trust the aggregator's first match, then fetch its USD price and 24h
//! change.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::config::ResolverConfig;
use crate::error::{degrade, ResolveError, Result};
use crate::http::HttpClient;
use crate::model::CoinQuote;
use crate::tracking::{notify_search, SearchTracker};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

pub struct AggregatorResolver {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    tracker: Option<Arc<dyn SearchTracker>>,
}

impl AggregatorResolver {
    pub fn new(http: HttpClient, config: &ResolverConfig) -> Self {
        Self {
            http,
            base_url: config.endpoints.aggregator_base.trim_end_matches('/').to_string(),
            api_key: config.aggregator_api_key.clone(),
            tracker: None,
        }
    }

    /// Report successful resolutions to an analytics collaborator
    pub fn with_tracker(mut self, tracker: Arc<dyn SearchTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Resolve a name or symbol; `None` on any failure
    pub async fn resolve(&self, query: &str) -> Option<CoinQuote> {
        let quote = degrade("aggregator", query, self.try_resolve(query).await)?;
        if let Some(tracker) = &self.tracker {
            notify_search(tracker, &quote);
        }
        Some(quote)
    }

    /// Logo URL of the first search match, for display next to trending coins
    pub async fn logo(&self, name: &str) -> Option<String> {
        let coin = degrade("aggregator-logo", name, self.first_match(name).await)?;
        coin.large
    }

    async fn first_match(&self, query: &str) -> Result<SearchCoin> {
        let query = query.trim().trim_start_matches('$');
        if query.is_empty() {
            return Err(ResolveError::NotFound("empty aggregator query".into()));
        }

        let search: SearchResponse = self
            .http
            .get_json(&format!("{}/search", self.base_url), &[("query", query)], self.headers())
            .await?;

        search
            .coins
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NotFound(format!("no aggregator match for {}", query)))
    }

    async fn try_resolve(&self, query: &str) -> Result<CoinQuote> {
        let coin = self.first_match(query).await?;

        let prices: HashMap<String, SimplePrice> = self
            .http
            .get_json(
                &format!("{}/simple/price", self.base_url),
                &[
                    ("ids", coin.id.as_str()),
                    ("vs_currencies", "usd"),
                    ("include_24hr_change", "true"),
                ],
                self.headers(),
            )
            .await?;

        let price = prices
            .get(&coin.id)
            .ok_or_else(|| ResolveError::NotFound(format!("no price for {}", coin.id)))?;
        let usd = price
            .usd
            .ok_or_else(|| ResolveError::NotFound(format!("no USD price for {}", coin.id)))?;

        tracing::debug!(id = %coin.id, usd, "aggregator price");
        Ok(CoinQuote::new(coin.name, &coin.symbol, usd)?.with_change(price.usd_24h_change))
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = self
            .api_key
            .as_deref()
            .and_then(|key| HeaderValue::from_str(key).ok())
        {
            headers.insert("x-cg-demo-api-key", value);
        }
        headers
    }
}
