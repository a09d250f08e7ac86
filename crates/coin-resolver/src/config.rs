//! Resolver Configuration
//!
//! One explicit object handed to every resolver constructor. Nothing here
//! is global: two pipelines with different retry policies can coexist.

use std::time::Duration;

use advisor_core::GenerationOptions;

use crate::retry::RetryPolicy;

/// Base URLs of the consumed services
#[derive(Clone, Debug)]
pub struct Endpoints {
    /// Price aggregator (`/search`, `/simple/price`)
    pub aggregator_base: String,

    /// DEX data aggregator (`/latest/dex/...`, `/token-pairs/v1/...`)
    pub dex_base: String,

    /// Generic web-search API returning ranked snippets
    pub search_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            aggregator_base: "https://api.coingecko.com/api/v3".into(),
            dex_base: "https://api.dexscreener.com".into(),
            search_base: "https://serpapi.com/search.json".into(),
        }
    }
}

impl Endpoints {
    /// Point every service at one host (tests, local proxies)
    pub fn with_host(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            aggregator_base: format!("{host}/api/v3"),
            dex_base: host.to_string(),
            search_base: format!("{host}/search.json"),
        }
    }
}

/// One block-explorer `tokeninfo` endpoint
#[derive(Clone, Debug)]
pub struct ExplorerChain {
    /// Chain slug reported on the quote (e.g., "ethereum")
    pub chain: String,
    pub base_url: String,
    /// Chains without a key are skipped
    pub api_key: Option<String>,
}

impl ExplorerChain {
    pub fn new(chain: impl Into<String>, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            chain: chain.into(),
            base_url: base_url.into(),
            api_key,
        }
    }
}

/// (chain, explorer API base, key variable), in lookup order
const EXPLORERS: &[(&str, &str, &str)] = &[
    ("ethereum", "https://api.etherscan.io/api", "ETHERSCAN_API_KEY"),
    ("bsc", "https://api.bscscan.com/api", "BSCSCAN_API_KEY"),
    ("polygon", "https://api.polygonscan.com/api", "POLYGONSCAN_API_KEY"),
    ("arbitrum", "https://api.arbiscan.io/api", "ARBISCAN_API_KEY"),
    ("base", "https://api.basescan.org/api", "BASESCAN_API_KEY"),
];

/// Complete resolver configuration
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    pub endpoints: Endpoints,

    /// Ordered explorer fallbacks for EVM contract addresses
    pub explorers: Vec<ExplorerChain>,

    /// Optional demo/pro key for the price aggregator
    pub aggregator_api_key: Option<String>,

    /// Key for the web-search API; search fallback is skipped without one
    pub search_api_key: Option<String>,

    /// Per-call retry policy
    pub retry: RetryPolicy,

    /// Timeout of a single HTTP request
    pub request_timeout: Duration,

    /// Budget for one whole orchestration; exceeding it is Unresolved
    pub pipeline_timeout: Duration,

    /// Quote tickers treated as USD
    pub stablecoins: Vec<String>,

    /// Quote assets tried, in order, when a bare mention falls through to the DEX
    pub mention_quotes: Vec<String>,

    /// Chain the base58 address family is looked up on first
    pub base58_chain: String,

    /// Page text is cut to this many characters before extraction
    pub max_page_chars: usize,

    /// Options for the constrained extraction prompts
    pub extraction: GenerationOptions,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            explorers: EXPLORERS
                .iter()
                .map(|(chain, base, _)| ExplorerChain::new(*chain, *base, None))
                .collect(),
            aggregator_api_key: None,
            search_api_key: None,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(10),
            pipeline_timeout: Duration::from_secs(45),
            stablecoins: ["USDC", "USDT", "DAI", "BUSD", "TUSD", "FDUSD", "USDE"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            mention_quotes: ["USDC", "USDT", "SOL", "WETH"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            base58_chain: "solana".into(),
            max_page_chars: 8000,
            extraction: GenerationOptions::extraction("llama3.2"),
        }
    }
}

impl ResolverConfig {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.aggregator_api_key = env_string("COINGECKO_API_KEY");
        config.search_api_key = env_string("SERPAPI_API_KEY");
        for explorer in &mut config.explorers {
            if let Some((_, _, key_var)) = EXPLORERS.iter().find(|(c, _, _)| *c == explorer.chain) {
                explorer.api_key = env_string(key_var);
            }
        }

        if let Some(attempts) = env_parse::<usize>("RESOLVER_RETRY_ATTEMPTS") {
            config.retry.attempts = attempts.max(1);
        }
        if let Some(ms) = env_parse::<u64>("RESOLVER_RETRY_DELAY_MS") {
            config.retry.initial_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse::<u64>("RESOLVER_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("RESOLVER_PIPELINE_TIMEOUT_SECS") {
            config.pipeline_timeout = Duration::from_secs(secs);
        }
        if let Some(model) = env_string("EXTRACTION_MODEL") {
            config.extraction.model = model;
        }

        config
    }

    /// Whether a quote ticker counts as USD
    pub fn is_stablecoin(&self, symbol: &str) -> bool {
        self.stablecoins.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.trim().parse().ok())
}
