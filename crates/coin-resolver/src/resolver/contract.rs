//! Contract Resolver
//!
//! Turns an on-chain address into a quote. DEX token-pair data comes
//! first (chain-scoped for base58 addresses, then cross-chain); block
//! explorers are the last resort and only supply a name and symbol, the
//! price then comes from the aggregator.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde_json::Value;

use super::aggregator::AggregatorResolver;
use super::dex::{best_pair, DexPair, DexResolver};
use crate::config::{ExplorerChain, ResolverConfig};
use crate::error::{degrade, ResolveError, Result};
use crate::http::HttpClient;
use crate::model::{AddressFamily, CoinQuote};

/// Name and symbol an explorer declares for a token contract
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExplorerToken {
    name: String,
    symbol: String,
}

pub struct ContractResolver {
    http: HttpClient,
    dex: Arc<DexResolver>,
    aggregator: Arc<AggregatorResolver>,
    explorers: Vec<ExplorerChain>,
    base58_chain: String,
}

impl ContractResolver {
    pub fn new(
        http: HttpClient,
        config: &ResolverConfig,
        dex: Arc<DexResolver>,
        aggregator: Arc<AggregatorResolver>,
    ) -> Self {
        Self {
            http,
            dex,
            aggregator,
            explorers: config.explorers.clone(),
            base58_chain: config.base58_chain.clone(),
        }
    }

    pub async fn resolve(&self, address: &str, family: AddressFamily) -> Option<CoinQuote> {
        if family == AddressFamily::Base58 {
            let scoped = self.dex.token_pairs(address, Some(&self.base58_chain)).await;
            if let Some(quote) = self.from_pairs(address, scoped).await {
                return Some(quote);
            }
        }

        let unscoped = self.dex.token_pairs(address, None).await;
        if let Some(quote) = self.from_pairs(address, unscoped).await {
            return Some(quote);
        }

        if family == AddressFamily::Evm {
            return self.resolve_via_explorers(address).await;
        }
        None
    }

    async fn from_pairs(&self, address: &str, pairs: Result<Vec<DexPair>>) -> Option<CoinQuote> {
        let pairs = degrade("dex-token", address, pairs)?;
        let best = best_pair(
            pairs
                .iter()
                .filter(|p| p.base_token.address.eq_ignore_ascii_case(address)),
        )?;

        let quote = degrade("dex-token", address, self.dex.price_pair(best).await)?;
        let chain = quote.chain_id.clone().unwrap_or_default();
        Some(quote.with_contract(address, chain))
    }

    /// First explorer reporting the token wins; errors on one chain never stop the loop
    async fn resolve_via_explorers(&self, address: &str) -> Option<CoinQuote> {
        for explorer in &self.explorers {
            let Some(api_key) = explorer.api_key.as_deref() else {
                tracing::trace!(chain = %explorer.chain, "explorer skipped, no API key");
                continue;
            };

            let token = match self.token_info(explorer, api_key, address).await {
                Ok(token) => token,
                Err(e) => {
                    tracing::debug!(chain = %explorer.chain, error = %e, "explorer lookup failed");
                    continue;
                }
            };

            tracing::debug!(chain = %explorer.chain, symbol = %token.symbol, "explorer found token");
            let priced = self.aggregator.resolve(&token.symbol).await?;
            return degrade(
                "explorer",
                address,
                CoinQuote::new(token.name, &token.symbol, priced.price_usd).map(|q| {
                    q.with_change(priced.change_24h_percent)
                        .with_contract(address, explorer.chain.clone())
                }),
            );
        }
        None
    }

    async fn token_info(&self, explorer: &ExplorerChain, api_key: &str, address: &str) -> Result<ExplorerToken> {
        let body: Value = self
            .http
            .get_json(
                &explorer.base_url,
                &[
                    ("module", "token"),
                    ("action", "tokeninfo"),
                    ("contractaddress", address),
                    ("apikey", api_key),
                ],
                HeaderMap::new(),
            )
            .await?;

        parse_token_info(&body)
            .ok_or_else(|| ResolveError::NotFound(format!("{} on {}", address, explorer.chain)))
    }
}

/// `{"status":"1","result":[{"tokenName":..,"symbol":..}]}`; on failure `result` is a message string
fn parse_token_info(body: &Value) -> Option<ExplorerToken> {
    if body.get("status").and_then(Value::as_str) != Some("1") {
        return None;
    }

    let info = match body.get("result")? {
        Value::Array(items) => items.first()?,
        obj @ Value::Object(_) => obj,
        _ => return None,
    };
    let name = info.get("tokenName").and_then(Value::as_str)?.trim();
    let symbol = info.get("symbol").and_then(Value::as_str)?.trim();
    if name.is_empty() || symbol.is_empty() {
        return None;
    }

    Some(ExplorerToken {
        name: name.to_string(),
        symbol: symbol.to_string(),
    })
}
