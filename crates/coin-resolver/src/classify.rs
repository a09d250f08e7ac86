//! Reference Classifier
//!
//! Decides which resolution path a query takes. The checks run as an
//! explicit priority list, so a query matching several patterns always
//! lands on the earliest one:
//!
//! 1. exchange pair link (`dexscreener.com/<chain>/<pair>`)
//! 2. standalone contract address (EVM hex or base58)
//! 3. `$TOKEN/QUOTE` pair notation
//! 4. any other URL
//! 5. bare mention (everything else)

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;

use crate::model::{AddressFamily, ReferenceDescriptor};

#[allow(clippy::expect_used)] // patterns are constants
fn pair_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:https?://)?(?:www\.)?dexscreener\.com/([a-z0-9-]+)/([A-Za-z0-9]+)")
            .expect("pair link regex is valid")
    })
}

#[allow(clippy::expect_used)]
fn evm_address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("evm regex is valid"))
}

#[allow(clippy::expect_used)]
fn base58_address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("base58 regex is valid")
    })
}

#[allow(clippy::expect_used)]
fn explicit_pair_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$([A-Za-z][A-Za-z0-9]*)/([A-Za-z][A-Za-z0-9]*)").expect("explicit pair regex is valid")
    })
}

#[allow(clippy::expect_used)]
fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)https?://[^\s<>]+").expect("url regex is valid"))
}

/// Classify a raw query. Never fails.
pub fn classify(text: &str) -> ReferenceDescriptor {
    if let Some(caps) = pair_link_regex().captures(text) {
        return ReferenceDescriptor::ExchangePairLink {
            chain: caps[1].to_ascii_lowercase(),
            pair_address: caps[2].to_string(),
        };
    }

    if let Some((address, family)) = find_contract_address(text) {
        return ReferenceDescriptor::ContractAddress { address, family };
    }

    if let Some(caps) = explicit_pair_regex().captures(text) {
        return ReferenceDescriptor::ExplicitPair {
            token: caps[1].to_uppercase(),
            quote: caps[2].to_uppercase(),
        };
    }

    if let Some(m) = url_regex().find(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '"', '\'']);
        return ReferenceDescriptor::GenericUrl { url: url.to_string() };
    }

    ReferenceDescriptor::BareMention { text: text.to_string() }
}

/// First whitespace-separated token that is an address on its own
fn find_contract_address(text: &str) -> Option<(String, AddressFamily)> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .find_map(|token| {
            if evm_address_regex().is_match(token) {
                Some((token.to_string(), AddressFamily::Evm))
            } else if base58_address_regex().is_match(token) {
                Some((token.to_string(), AddressFamily::Base58))
            } else {
                None
            }
        })
}

/// Coin id from a price-aggregator coin page (`.../coins/<id>`)
pub fn aggregator_coin_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host != "coingecko.com" && !host.ends_with(".coingecko.com") {
        return None;
    }

    let mut segments = parsed.path_segments()?;
    segments.find(|s| *s == "coins")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(|id| id.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReferenceKind;

    const EVM: &str = "0x6982508145454ce325ddbe47a25d4ec3d2311933";
    const SOL_MINT: &str = "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm";

    #[test]
    fn test_pair_link() {
        let r = classify("what about https://dexscreener.com/solana/ABC123 today?");
        assert_eq!(
            r,
            ReferenceDescriptor::ExchangePairLink {
                chain: "solana".into(),
                pair_address: "ABC123".into()
            }
        );
    }

    #[test]
    fn test_pair_link_without_scheme() {
        let r = classify("dexscreener.com/Base/0xPAIR99");
        assert_eq!(
            r,
            ReferenceDescriptor::ExchangePairLink {
                chain: "base".into(),
                pair_address: "0xPAIR99".into()
            }
        );
    }

    #[test]
    fn test_pair_link_beats_embedded_address() {
        let text = format!("https://dexscreener.com/ethereum/{} and {}", SOL_MINT, EVM);
        assert_eq!(classify(&text).kind(), ReferenceKind::ExchangePairLink);
    }

    #[test]
    fn test_evm_address() {
        let r = classify(&format!("is {} a buy?", EVM));
        assert_eq!(
            r,
            ReferenceDescriptor::ContractAddress {
                address: EVM.into(),
                family: AddressFamily::Evm
            }
        );
    }

    #[test]
    fn test_base58_address_with_punctuation() {
        let r = classify(&format!("check ({SOL_MINT})."));
        assert_eq!(
            r,
            ReferenceDescriptor::ContractAddress {
                address: SOL_MINT.into(),
                family: AddressFamily::Base58
            }
        );
    }

    #[test]
    fn test_address_beats_explicit_pair() {
        let r = classify(&format!("$PEPE/WETH {}", EVM));
        assert_eq!(r.kind(), ReferenceKind::ContractAddress);
    }

    #[test]
    fn test_explicit_pair() {
        let r = classify("thoughts on $wif/sol?");
        assert_eq!(
            r,
            ReferenceDescriptor::ExplicitPair {
                token: "WIF".into(),
                quote: "SOL".into()
            }
        );
    }

    #[test]
    fn test_explicit_pair_beats_generic_url() {
        let r = classify("$PEPE/USDC see https://example.com/pepe");
        assert_eq!(r.kind(), ReferenceKind::ExplicitPair);
    }

    #[test]
    fn test_generic_url_trims_punctuation() {
        let r = classify("read https://www.coingecko.com/en/coins/bitcoin.");
        assert_eq!(
            r,
            ReferenceDescriptor::GenericUrl {
                url: "https://www.coingecko.com/en/coins/bitcoin".into()
            }
        );
    }

    #[test]
    fn test_bare_mention() {
        let r = classify("should I buy $bitcoin now?");
        assert_eq!(
            r,
            ReferenceDescriptor::BareMention {
                text: "should I buy $bitcoin now?".into()
            }
        );
    }

    #[test]
    fn test_ordinary_words_are_not_addresses() {
        assert_eq!(
            classify("internationalization considerations everywhere").kind(),
            ReferenceKind::BareMention
        );
    }

    #[test]
    fn test_dollar_amount_rate_is_not_pair() {
        let descriptor = classify("should I DCA $100/month into $BTC?");
        assert_eq!(descriptor.kind(), ReferenceKind::BareMention);
    }

    #[test]
    fn test_short_hex_is_not_address() {
        assert_eq!(classify("0x1234 hello").kind(), ReferenceKind::BareMention);
    }

    #[test]
    fn test_aggregator_coin_id() {
        assert_eq!(
            aggregator_coin_id("https://www.coingecko.com/en/coins/Bitcoin"),
            Some("bitcoin".into())
        );
        assert_eq!(
            aggregator_coin_id("https://coingecko.com/coins/dogwifcoin?tab=markets"),
            Some("dogwifcoin".into())
        );
        assert_eq!(aggregator_coin_id("https://example.com/coins/bitcoin"), None);
        assert_eq!(aggregator_coin_id("https://www.coingecko.com/en/categories"), None);
    }
}
