//! Domain Models
//!
//! The classified form of a user query and the single price quote the
//! pipeline produces for it. Prices are plain `f64`: upstreams report
//! doubles and no rounding happens at this layer.

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};

/// Address space a contract address belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFamily {
    /// `0x` + 40 hex characters (Ethereum and EVM chains)
    Evm,
    /// 32-44 character base58 string (Solana)
    Base58,
}

/// Discriminant of a `ReferenceDescriptor`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    ExchangePairLink,
    ContractAddress,
    ExplicitPair,
    GenericUrl,
    BareMention,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReferenceKind::ExchangePairLink => "exchange_pair_link",
            ReferenceKind::ContractAddress => "contract_address",
            ReferenceKind::ExplicitPair => "explicit_pair",
            ReferenceKind::GenericUrl => "generic_url",
            ReferenceKind::BareMention => "bare_mention",
        };
        f.write_str(label)
    }
}

/// What a query refers to, with the payload each kind needs downstream
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceDescriptor {
    /// `dexscreener.com/<chain>/<pair>` link
    ExchangePairLink { chain: String, pair_address: String },

    /// Standalone on-chain address
    ContractAddress { address: String, family: AddressFamily },

    /// `$TOKEN/QUOTE` notation
    ExplicitPair { token: String, quote: String },

    /// Any other URL
    GenericUrl { url: String },

    /// Free text for language-model extraction
    BareMention { text: String },
}

impl ReferenceDescriptor {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            ReferenceDescriptor::ExchangePairLink { .. } => ReferenceKind::ExchangePairLink,
            ReferenceDescriptor::ContractAddress { .. } => ReferenceKind::ContractAddress,
            ReferenceDescriptor::ExplicitPair { .. } => ReferenceKind::ExplicitPair,
            ReferenceDescriptor::GenericUrl { .. } => ReferenceKind::GenericUrl,
            ReferenceDescriptor::BareMention { .. } => ReferenceKind::BareMention,
        }
    }
}

/// A resolved USD quote
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinQuote {
    /// Display name (e.g., "Bitcoin")
    pub name: String,

    /// Ticker, always upper-cased
    pub symbol: String,

    /// Positive, finite USD price
    pub price_usd: f64,

    /// 24h change; `None` when the source did not report it
    pub change_24h_percent: Option<f64>,

    /// Quote-asset ticker of the DEX pair the price came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_symbol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

impl CoinQuote {
    /// Validate and build a quote; a non-positive or non-finite price is a
    /// resolver failure, never a quote
    pub fn new(name: impl Into<String>, symbol: impl AsRef<str>, price_usd: f64) -> Result<Self> {
        let name = name.into();
        let symbol = symbol.as_ref().trim().to_uppercase();

        if name.trim().is_empty() {
            return Err(ResolveError::MalformedResponse("quote without a name".into()));
        }
        if symbol.is_empty() {
            return Err(ResolveError::MalformedResponse(format!("quote for {} without a symbol", name)));
        }
        if !price_usd.is_finite() || price_usd <= 0.0 {
            return Err(ResolveError::MalformedResponse(format!(
                "invalid USD price {} for {}",
                price_usd, symbol
            )));
        }

        Ok(Self {
            name,
            symbol,
            price_usd,
            change_24h_percent: None,
            base_symbol: None,
            pair_address: None,
            contract_address: None,
            chain_id: None,
        })
    }

    /// Attach a 24h change; non-finite values are dropped rather than stored
    pub fn with_change(mut self, change: Option<f64>) -> Self {
        self.change_24h_percent = change.filter(|c| c.is_finite());
        self
    }

    /// Attach DEX pair provenance
    pub fn with_pair(
        mut self,
        chain_id: impl Into<String>,
        pair_address: impl Into<String>,
        base_symbol: impl AsRef<str>,
    ) -> Self {
        self.chain_id = Some(chain_id.into());
        self.pair_address = Some(pair_address.into());
        self.base_symbol = Some(base_symbol.as_ref().to_uppercase());
        self
    }

    /// Attach contract provenance
    pub fn with_contract(mut self, contract_address: impl Into<String>, chain_id: impl Into<String>) -> Self {
        self.contract_address = Some(contract_address.into());
        self.chain_id = Some(chain_id.into());
        self
    }

    /// One-line summary for prompts and logs
    pub fn summary(&self) -> String {
        let price = if self.price_usd >= 1.0 {
            format!("${:.2}", self.price_usd)
        } else {
            format!("${:.8}", self.price_usd)
        };
        let change = self
            .change_24h_percent
            .map(|c| format!(" ({:+.2}% 24h)", c))
            .unwrap_or_default();
        let pair = self
            .base_symbol
            .as_ref()
            .map(|b| format!(" via {}/{} pair", self.symbol, b))
            .unwrap_or_default();
        let chain = self
            .chain_id
            .as_ref()
            .map(|c| format!(" on {}", c))
            .unwrap_or_default();

        format!("{} ({}): {}{}{}{}", self.name, self.symbol, price, change, pair, chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_uppercases_symbol() {
        let quote = CoinQuote::new("Bitcoin", "btc", 65000.12).unwrap();
        assert_eq!(quote.symbol, "BTC");
        assert_eq!(quote.change_24h_percent, None);
        assert!(quote.pair_address.is_none());
    }

    #[test]
    fn test_quote_rejects_bad_prices() {
        assert!(CoinQuote::new("Bitcoin", "btc", 0.0).is_err());
        assert!(CoinQuote::new("Bitcoin", "btc", -3.0).is_err());
        assert!(CoinQuote::new("Bitcoin", "btc", f64::NAN).is_err());
        assert!(CoinQuote::new("Bitcoin", "btc", f64::INFINITY).is_err());
        assert!(CoinQuote::new("", "btc", 1.0).is_err());
    }

    #[test]
    fn test_non_finite_change_dropped() {
        let quote = CoinQuote::new("Bitcoin", "btc", 1.0).unwrap().with_change(Some(f64::NAN));
        assert_eq!(quote.change_24h_percent, None);
    }

    #[test]
    fn test_summary_formats_small_prices() {
        let quote = CoinQuote::new("Pepe", "pepe", 0.000012)
            .unwrap()
            .with_change(Some(-4.5))
            .with_pair("ethereum", "0xpair", "weth");
        let summary = quote.summary();
        assert!(summary.contains("$0.00001200"));
        assert!(summary.contains("-4.50% 24h"));
        assert!(summary.contains("PEPE/WETH"));
    }

    #[test]
    fn test_quote_serializes_camel_case() {
        let quote = CoinQuote::new("Bitcoin", "BTC", 65000.12).unwrap().with_change(Some(2.5));
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["priceUsd"], 65000.12);
        assert_eq!(json["change24hPercent"], 2.5);
        assert!(json.get("pairAddress").is_none());
    }
}
