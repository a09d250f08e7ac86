//! DEX Resolver
//!
//! Prices tokens from decentralized-exchange pair data. Among the pairs
//! matching a base/quote symbol pair the most liquid one wins; when its
//! quote asset is not a stablecoin a second lookup converts the native
//! price into USD.

use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::config::ResolverConfig;
use crate::error::{degrade, ResolveError, Result};
use crate::http::HttpClient;
use crate::model::CoinQuote;

/// `{"pairs": [...]}` or, for some pair lookups, `{"pair": {...}}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PairsResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
    #[serde(default)]
    pub pair: Option<DexPair>,
}

impl PairsResponse {
    pub fn into_pairs(self) -> Vec<DexPair> {
        let mut pairs = self.pairs.unwrap_or_default();
        pairs.extend(self.pair);
        pairs
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DexPair {
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub pair_address: String,
    pub base_token: DexToken,
    pub quote_token: DexToken,
    /// Price of the base token in units of the quote token
    pub price_native: Option<String>,
    #[serde(default)]
    pub liquidity: Option<Liquidity>,
    #[serde(default)]
    pub price_change: Option<PriceChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DexToken {
    #[serde(default)]
    pub address: String,
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Liquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PriceChange {
    pub h24: Option<f64>,
}

impl DexPair {
    /// Reported USD liquidity; missing or non-finite counts as zero
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity
            .as_ref()
            .and_then(|l| l.usd)
            .filter(|usd| usd.is_finite())
            .unwrap_or(0.0)
    }

    pub fn native_price(&self) -> Result<f64> {
        let raw = self.price_native.as_deref().ok_or_else(|| {
            ResolveError::MalformedResponse(format!("pair {} has no native price", self.pair_address))
        })?;
        let price: f64 = raw.trim().parse().map_err(|_| {
            ResolveError::MalformedResponse(format!("pair {} native price {:?}", self.pair_address, raw))
        })?;
        if price.is_finite() && price > 0.0 {
            Ok(price)
        } else {
            Err(ResolveError::MalformedResponse(format!(
                "pair {} native price {}",
                self.pair_address, price
            )))
        }
    }

    fn matches(&self, token: &str, quote: &str) -> bool {
        self.base_token.symbol.eq_ignore_ascii_case(token)
            && self.quote_token.symbol.eq_ignore_ascii_case(quote)
    }
}

/// Highest-liquidity pair. Independent of input order when the maximum is unique.
pub(crate) fn best_pair<'a, I>(pairs: I) -> Option<&'a DexPair>
where
    I: IntoIterator<Item = &'a DexPair>,
{
    pairs
        .into_iter()
        .max_by(|a, b| a.liquidity_usd().total_cmp(&b.liquidity_usd()))
}

pub struct DexResolver {
    http: HttpClient,
    base_url: String,
    stablecoins: Vec<String>,
    mention_quotes: Vec<String>,
}

impl DexResolver {
    pub fn new(http: HttpClient, config: &ResolverConfig) -> Self {
        Self {
            http,
            base_url: config.endpoints.dex_base.trim_end_matches('/').to_string(),
            stablecoins: config.stablecoins.clone(),
            mention_quotes: config.mention_quotes.clone(),
        }
    }

    /// Price `token` from its most liquid `token/quote` pair
    pub async fn resolve(&self, token: &str, quote: &str) -> Option<CoinQuote> {
        let subject = format!("{}/{}", token, quote);
        degrade("dex", &subject, self.try_resolve(token, quote).await)
    }

    /// Price the base token of one specific pair
    pub async fn resolve_by_pair_address(&self, chain: &str, pair_address: &str) -> Option<CoinQuote> {
        degrade(
            "dex-pair",
            pair_address,
            self.try_resolve_pair(chain, pair_address).await,
        )
    }

    /// Bare-mention fallback: try each configured quote asset in order
    pub async fn resolve_mention(&self, symbol: &str) -> Option<CoinQuote> {
        let symbol = symbol.trim().trim_start_matches('$');
        for quote in &self.mention_quotes {
            if quote.eq_ignore_ascii_case(symbol) {
                continue;
            }
            if let Some(found) = self.resolve(symbol, quote).await {
                return Some(found);
            }
        }
        None
    }

    async fn try_resolve(&self, token: &str, quote: &str) -> Result<CoinQuote> {
        let pairs = self.search(&format!("{}/{}", token, quote)).await?;
        let best = best_pair(pairs.iter().filter(|p| p.matches(token, quote)))
            .ok_or_else(|| ResolveError::NotFound(format!("no {}/{} pair", token, quote)))?;

        self.price_pair(best).await
    }

    async fn try_resolve_pair(&self, chain: &str, pair_address: &str) -> Result<CoinQuote> {
        let url = format!("{}/latest/dex/pairs/{}/{}", self.base_url, chain, pair_address);
        let response: PairsResponse = self.http.get_json(&url, &[], HeaderMap::new()).await?;

        let mut pair = response
            .into_pairs()
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NotFound(format!("pair {} on {}", pair_address, chain)))?;
        if pair.chain_id.is_empty() {
            pair.chain_id = chain.to_string();
        }

        self.price_pair(&pair).await
    }

    /// Convert a pair's native price to USD and build the quote
    pub(crate) async fn price_pair(&self, pair: &DexPair) -> Result<CoinQuote> {
        let quote_usd = self.quote_asset_usd(&pair.quote_token.symbol).await?;
        quote_from_pair(pair, quote_usd)
    }

    /// USD price of one unit of a quote asset
    async fn quote_asset_usd(&self, quote: &str) -> Result<f64> {
        if self.is_stablecoin(quote) {
            return Ok(1.0);
        }

        let stable = self
            .stablecoins
            .first()
            .ok_or_else(|| ResolveError::Config("no stablecoins configured".into()))?;
        let pairs = self.search(&format!("{}/{}", quote, stable)).await?;
        let best = best_pair(pairs.iter().filter(|p| {
            p.base_token.symbol.eq_ignore_ascii_case(quote) && self.is_stablecoin(&p.quote_token.symbol)
        }))
        .ok_or_else(|| ResolveError::NotFound(format!("no USD-pegged pair for {}", quote)))?;

        let usd = best.native_price()?;
        tracing::debug!(quote, usd, pair = %best.pair_address, "quote asset converted");
        Ok(usd)
    }

    async fn search(&self, q: &str) -> Result<Vec<DexPair>> {
        let url = format!("{}/latest/dex/search", self.base_url);
        let response: PairsResponse = self.http.get_json(&url, &[("q", q)], HeaderMap::new()).await?;
        Ok(response.into_pairs())
    }

    /// Pairs trading a token address, optionally scoped to one chain
    pub(crate) async fn token_pairs(&self, address: &str, chain: Option<&str>) -> Result<Vec<DexPair>> {
        match chain {
            Some(chain) => {
                let url = format!("{}/token-pairs/v1/{}/{}", self.base_url, chain, address);
                self.http.get_json(&url, &[], HeaderMap::new()).await
            }
            None => {
                let url = format!("{}/latest/dex/tokens/{}", self.base_url, address);
                let response: PairsResponse = self.http.get_json(&url, &[], HeaderMap::new()).await?;
                Ok(response.into_pairs())
            }
        }
    }

    fn is_stablecoin(&self, symbol: &str) -> bool {
        self.stablecoins.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }
}

/// `priceUsd = priceNative × quoteAssetUsd`, no rounding
pub(crate) fn quote_from_pair(pair: &DexPair, quote_usd: f64) -> Result<CoinQuote> {
    let price = pair.native_price()? * quote_usd;
    let name = pair
        .base_token
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| pair.base_token.symbol.clone());

    Ok(CoinQuote::new(name, &pair.base_token.symbol, price)?
        .with_change(pair.price_change.as_ref().and_then(|c| c.h24))
        .with_pair(&pair.chain_id, &pair.pair_address, &pair.quote_token.symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use crate::retry::RetryPolicy;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pair_json(base: &str, quote: &str, native: &str, liquidity: f64, address: &str) -> Value {
        json!({
            "chainId": "solana",
            "dexId": "raydium",
            "pairAddress": address,
            "baseToken": {"address": format!("{}-mint", base.to_lowercase()), "name": format!("{} Token", base), "symbol": base},
            "quoteToken": {"address": format!("{}-mint", quote.to_lowercase()), "name": quote, "symbol": quote},
            "priceNative": native,
            "priceUsd": "0",
            "liquidity": {"usd": liquidity},
            "priceChange": {"h24": -1.25}
        })
    }

    fn parse(value: Value) -> DexPair {
        serde_json::from_value(value).unwrap()
    }

    fn resolver(server: &MockServer) -> DexResolver {
        let config = ResolverConfig {
            endpoints: Endpoints::with_host(&server.uri()),
            retry: RetryPolicy::none(),
            ..ResolverConfig::default()
        };
        DexResolver::new(HttpClient::new(&config).unwrap(), &config)
    }

    #[test]
    fn test_best_pair_order_independent() {
        let pairs = vec![
            parse(pair_json("WIF", "SOL", "0.01", 10_000.0, "low")),
            parse(pair_json("WIF", "SOL", "0.02", 900_000.0, "high")),
            parse(pair_json("WIF", "SOL", "0.03", 50_000.0, "mid")),
        ];
        let orders: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

        for order in orders {
            let permuted: Vec<&DexPair> = order.iter().map(|&i| &pairs[i]).collect();
            assert_eq!(best_pair(permuted).unwrap().pair_address, "high");
        }
    }

    #[test]
    fn test_missing_liquidity_ranks_last() {
        let mut bare = pair_json("WIF", "SOL", "0.01", 0.0, "bare");
        bare.as_object_mut().unwrap().remove("liquidity");
        let pairs = [parse(bare), parse(pair_json("WIF", "SOL", "0.01", 5.0, "some"))];

        assert_eq!(best_pair(&pairs).unwrap().pair_address, "some");
        assert!(best_pair(&[] as &[DexPair]).is_none());
    }

    #[test]
    fn test_quote_from_pair_multiplies() {
        let pair = parse(pair_json("WIF", "SOL", "0.5", 1.0, "ABC123"));
        let quote = quote_from_pair(&pair, 150.0).unwrap();

        assert_eq!(quote.price_usd, 75.0);
        assert_eq!(quote.symbol, "WIF");
        assert_eq!(quote.base_symbol.as_deref(), Some("SOL"));
        assert_eq!(quote.pair_address.as_deref(), Some("ABC123"));
        assert_eq!(quote.chain_id.as_deref(), Some("solana"));
        assert_eq!(quote.change_24h_percent, Some(-1.25));
    }

    #[test]
    fn test_unparsable_native_price_fails() {
        let pair = parse(pair_json("WIF", "SOL", "n/a", 1.0, "p"));
        assert!(matches!(quote_from_pair(&pair, 1.0), Err(ResolveError::MalformedResponse(_))));

        let zero = parse(pair_json("WIF", "SOL", "0", 1.0, "p"));
        assert!(quote_from_pair(&zero, 1.0).is_err());
    }

    #[tokio::test]
    async fn test_stable_quote_uses_native_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest/dex/search"))
            .and(query_param("q", "PEPE/USDT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pairs": [
                    pair_json("PEPE", "USDT", "0.0000120", 2_000_000.0, "best"),
                    pair_json("PEPE", "USDT", "0.0000099", 1_000.0, "thin"),
                    pair_json("PEPE2", "USDT", "5", 9_000_000.0, "impostor")
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let quote = resolver(&server).resolve("pepe", "usdt").await.unwrap();
        assert_eq!(quote.price_usd, 0.000012);
        assert_eq!(quote.pair_address.as_deref(), Some("best"));
    }

    #[tokio::test]
    async fn test_non_stable_quote_is_converted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest/dex/search"))
            .and(query_param("q", "WIF/SOL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pairs": [pair_json("WIF", "SOL", "0.02", 100_000.0, "wifsol")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/dex/search"))
            .and(query_param("q", "SOL/USDC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pairs": [
                    pair_json("SOL", "USDC", "150", 50_000_000.0, "solusdc"),
                    pair_json("SOL", "USDC", "149", 10.0, "dust"),
                    pair_json("SOL", "WETH", "0.05", 90_000_000.0, "solweth")
                ]
            })))
            .mount(&server)
            .await;

        let quote = resolver(&server).resolve("WIF", "SOL").await.unwrap();
        assert_eq!(quote.price_usd, 0.02 * 150.0);
        assert_eq!(quote.base_symbol.as_deref(), Some("SOL"));
    }

    #[tokio::test]
    async fn test_no_usd_pair_for_quote_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest/dex/search"))
            .and(query_param("q", "WIF/SOL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pairs": [pair_json("WIF", "SOL", "0.02", 100_000.0, "wifsol")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/dex/search"))
            .and(query_param("q", "SOL/USDC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pairs": null})))
            .mount(&server)
            .await;

        assert!(resolver(&server).resolve("WIF", "SOL").await.is_none());
    }

    #[tokio::test]
    async fn test_pair_address_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest/dex/pairs/solana/ABC123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pair": pair_json("BONK", "USDC", "0.000021", 3_000_000.0, "ABC123")
            })))
            .mount(&server)
            .await;

        let quote = resolver(&server)
            .resolve_by_pair_address("solana", "ABC123")
            .await
            .unwrap();
        assert_eq!(quote.symbol, "BONK");
        assert_eq!(quote.price_usd, 0.000021);
    }

    #[tokio::test]
    async fn test_mention_tries_quotes_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest/dex/search"))
            .and(query_param("q", "MOG/USDC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pairs": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/dex/search"))
            .and(query_param("q", "MOG/USDT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pairs": [pair_json("MOG", "USDT", "0.0000015", 400_000.0, "mogusdt")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let quote = resolver(&server).resolve_mention("$MOG").await.unwrap();
        assert_eq!(quote.pair_address.as_deref(), Some("mogusdt"));
    }
}
