//! Resolution Orchestrator
//!
//! Classifies a query, plans the resolver chain for its kind, and walks
//! that chain until one resolver produces a quote. The whole walk runs
//! under one deadline; running out of time is the same as running out of
//! resolvers.
//!
//! ```text
//! ClassifyInput ──▶ TryPrimary ──▶ TryFallback(1) ──▶ … ──▶ Unresolved
//!                       │                │
//!                       └────────────────┴──────────▶ Resolved
//! ```

use std::sync::Arc;
use std::time::Duration;

use advisor_core::LlmProvider;
use tracing::Instrument;

use crate::classify::{aggregator_coin_id, classify};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::model::{AddressFamily, CoinQuote, ReferenceDescriptor};
use crate::resolver::{AggregatorResolver, ContractResolver, DexResolver, ExtractionResolver};
use crate::tracking::SearchTracker;

/// Shown to the user when nothing could be resolved
pub const UNRESOLVED_MESSAGE: &str = "I couldn't find a cryptocurrency in your message. \
Mention a coin with a $ prefix (for example $BTC or $bitcoin), use pair notation like $WIF/SOL, \
paste a contract address, or share a DexScreener or CoinGecko link.";

/// Outcome of one orchestration
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Resolved(CoinQuote),
    Unresolved,
}

impl Resolution {
    pub fn quote(&self) -> Option<&CoinQuote> {
        match self {
            Resolution::Resolved(quote) => Some(quote),
            Resolution::Unresolved => None,
        }
    }

    pub fn into_quote(self) -> Option<CoinQuote> {
        match self {
            Resolution::Resolved(quote) => Some(quote),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Orchestration states, logged as the pipeline advances
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    ClassifyInput,
    TryPrimary,
    TryFallback(usize),
    Resolved,
    Unresolved,
}

/// One resolver invocation in a plan
#[derive(Clone, Debug, PartialEq, Eq)]
enum Step {
    DexPairAddress { chain: String, pair_address: String },
    Contract { address: String, family: AddressFamily },
    DexPair { token: String, quote: String },
    AggregatorId(String),
    Page(String),
    Mention(String),
}

impl Step {
    fn label(&self) -> &'static str {
        match self {
            Step::DexPairAddress { .. } => "dex_pair_address",
            Step::Contract { .. } => "contract",
            Step::DexPair { .. } => "dex_pair",
            Step::AggregatorId(_) => "aggregator_id",
            Step::Page(_) => "page_extraction",
            Step::Mention(_) => "mention_extraction",
        }
    }
}

/// Resolver order for a classified reference
fn plan(descriptor: &ReferenceDescriptor) -> Vec<Step> {
    match descriptor {
        ReferenceDescriptor::ExchangePairLink { chain, pair_address } => vec![Step::DexPairAddress {
            chain: chain.clone(),
            pair_address: pair_address.clone(),
        }],
        ReferenceDescriptor::ContractAddress { address, family } => vec![Step::Contract {
            address: address.clone(),
            family: *family,
        }],
        ReferenceDescriptor::ExplicitPair { token, quote } => vec![Step::DexPair {
            token: token.clone(),
            quote: quote.clone(),
        }],
        ReferenceDescriptor::GenericUrl { url } => match aggregator_coin_id(url) {
            // id lookup replaces page scraping
            Some(id) => vec![Step::AggregatorId(id)],
            None => vec![Step::Page(url.clone())],
        },
        ReferenceDescriptor::BareMention { text } => vec![Step::Mention(text.clone())],
    }
}

/// The reference resolution pipeline
pub struct ResolutionPipeline {
    aggregator: Arc<AggregatorResolver>,
    dex: Arc<DexResolver>,
    contract: ContractResolver,
    extraction: ExtractionResolver,
    pipeline_timeout: Duration,
}

impl ResolutionPipeline {
    pub fn new(
        config: &ResolverConfig,
        llm: Arc<dyn LlmProvider>,
        tracker: Option<Arc<dyn SearchTracker>>,
    ) -> Result<Self> {
        let http = HttpClient::new(config)?;

        let mut aggregator = AggregatorResolver::new(http.clone(), config);
        if let Some(tracker) = tracker {
            aggregator = aggregator.with_tracker(tracker);
        }
        let aggregator = Arc::new(aggregator);
        let dex = Arc::new(DexResolver::new(http.clone(), config));
        let contract = ContractResolver::new(http.clone(), config, dex.clone(), aggregator.clone());
        let extraction = ExtractionResolver::new(llm, http, config, aggregator.clone(), dex.clone());

        Ok(Self {
            aggregator,
            dex,
            contract,
            extraction,
            pipeline_timeout: config.pipeline_timeout,
        })
    }

    /// Aggregator used by the pipeline, for lookups outside a resolution
    pub fn aggregator(&self) -> &AggregatorResolver {
        &self.aggregator
    }

    /// Resolve free text to a quote. Never fails; every problem ends in `Unresolved`.
    pub async fn resolve(&self, text: &str) -> Resolution {
        tracing::debug!(stage = ?Stage::ClassifyInput, "classifying query");
        let descriptor = classify(text);
        let span = tracing::info_span!("resolve", kind = %descriptor.kind());

        async {
            let resolution = match tokio::time::timeout(self.pipeline_timeout, self.run(&descriptor)).await {
                Ok(Some(quote)) => Resolution::Resolved(quote),
                Ok(None) => Resolution::Unresolved,
                Err(_) => {
                    tracing::warn!(timeout = ?self.pipeline_timeout, "resolution deadline exceeded");
                    Resolution::Unresolved
                }
            };

            match resolution.quote() {
                Some(quote) => tracing::info!(stage = ?Stage::Resolved, quote = %quote.summary(), "query resolved"),
                None => tracing::info!(stage = ?Stage::Unresolved, "query unresolved"),
            }
            resolution
        }
        .instrument(span)
        .await
    }

    async fn run(&self, descriptor: &ReferenceDescriptor) -> Option<CoinQuote> {
        for (index, step) in plan(descriptor).iter().enumerate() {
            let stage = if index == 0 {
                Stage::TryPrimary
            } else {
                Stage::TryFallback(index)
            };
            tracing::debug!(?stage, step = step.label(), "trying resolver");

            if let Some(quote) = self.attempt(step).await {
                return Some(quote);
            }
        }
        None
    }

    async fn attempt(&self, step: &Step) -> Option<CoinQuote> {
        match step {
            Step::DexPairAddress { chain, pair_address } => {
                self.dex.resolve_by_pair_address(chain, pair_address).await
            }
            Step::Contract { address, family } => self.contract.resolve(address, *family).await,
            Step::DexPair { token, quote } => self.dex.resolve(token, quote).await,
            Step::AggregatorId(id) => self.aggregator.resolve(id).await,
            Step::Page(url) => self.extraction.resolve_from_url(url).await,
            Step::Mention(text) => self.extraction.resolve_from_text(text).await,
        }
    }
}
