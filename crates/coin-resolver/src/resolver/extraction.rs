//! Page/Search Extraction Resolver
//!
//! Language-model extraction for inputs with no structure to match on:
//!
//! - `resolve_from_url`: fetch a page, strip it to text, and ask the model
//!   for `Coin: <name>, Price: <value>`
//! - `resolve_from_text`: ask the model for `$symbol` mentions, then try
//!   the aggregator, the DEX and finally web-search snippets
//!
//! The extraction calls themselves are never retried.

use std::sync::{Arc, OnceLock};

use advisor_core::{GenerationOptions, LlmProvider, Message};
use regex::Regex;

use super::aggregator::AggregatorResolver;
use super::dex::DexResolver;
use super::page::fetch_page_text;
use super::web_search::{first_number, WebSearchResolver};
use crate::config::ResolverConfig;
use crate::error::{degrade, ResolveError, Result};
use crate::http::HttpClient;
use crate::model::CoinQuote;
use crate::prompts::{MENTION_EXTRACTION_PROMPT, PAGE_EXTRACTION_PROMPT};

#[allow(clippy::expect_used)] // patterns are constants
fn page_reply_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)coin:\s*([^,\n]*?)\s*,\s*price:\s*([^\n]*)").expect("page reply regex is valid")
    })
}

#[allow(clippy::expect_used)]
fn dollar_mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$([A-Za-z][A-Za-z0-9]{1,14})\b").expect("mention regex is valid"))
}

/// Parse `Coin: <name>, Price: <value>`; `none` or a missing field is ambiguous
pub(crate) fn parse_page_reply(reply: &str) -> Result<(String, f64)> {
    let reply = reply.trim();
    if reply.eq_ignore_ascii_case("none") {
        return Err(ResolveError::ExtractionAmbiguous("model found no coin on the page".into()));
    }

    let caps = page_reply_regex()
        .captures(reply)
        .ok_or_else(|| ResolveError::ExtractionAmbiguous(format!("unexpected reply {:?}", reply)))?;

    let name = caps[1].trim().trim_matches(|c| c == '"' || c == '\'').to_string();
    if name.is_empty() || name.eq_ignore_ascii_case("none") {
        return Err(ResolveError::ExtractionAmbiguous("reply without a coin name".into()));
    }
    let price = first_number(&caps[2])
        .ok_or_else(|| ResolveError::ExtractionAmbiguous(format!("no price for {}", name)))?;

    Ok((name, price))
}

/// Split a mention-extraction reply into bare symbols, order kept, duplicates dropped
pub(crate) fn parse_mentions(reply: &str) -> Vec<String> {
    let reply = reply.trim();
    if reply.eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    let mut mentions: Vec<String> = Vec::new();
    for raw in reply.split([',', '\n']) {
        let mention = raw.trim().trim_start_matches('$').trim();
        let valid = !mention.is_empty()
            && mention.len() <= 40
            && !mention.eq_ignore_ascii_case("none")
            && mention.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '));
        if valid && !mentions.iter().any(|m| m.eq_ignore_ascii_case(mention)) {
            mentions.push(mention.to_string());
        }
    }
    mentions
}

/// `$symbol` mentions found without a model
pub(crate) fn local_mentions(text: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    for caps in dollar_mention_regex().captures_iter(text) {
        let mention = &caps[1];
        if !mentions.iter().any(|m| m.eq_ignore_ascii_case(mention)) {
            mentions.push(mention.to_string());
        }
    }
    mentions
}

/// Ticker for a quote built from a page: the name upper-cased, spaces removed
fn symbol_from_name(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_uppercase()
}

pub struct ExtractionResolver {
    llm: Arc<dyn LlmProvider>,
    http: HttpClient,
    options: GenerationOptions,
    max_page_chars: usize,
    aggregator: Arc<AggregatorResolver>,
    dex: Arc<DexResolver>,
    web: WebSearchResolver,
}

impl ExtractionResolver {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        http: HttpClient,
        config: &ResolverConfig,
        aggregator: Arc<AggregatorResolver>,
        dex: Arc<DexResolver>,
    ) -> Self {
        Self {
            llm,
            web: WebSearchResolver::new(http.clone(), config),
            http,
            options: config.extraction.clone(),
            max_page_chars: config.max_page_chars,
            aggregator,
            dex,
        }
    }

    pub async fn resolve_from_url(&self, url: &str) -> Option<CoinQuote> {
        degrade("page-extraction", url, self.try_from_url(url).await)
    }

    async fn try_from_url(&self, url: &str) -> Result<CoinQuote> {
        let text = fetch_page_text(&self.http, url, self.max_page_chars).await?;
        let reply = self.extract(PAGE_EXTRACTION_PROMPT, text).await?;
        let (name, price) = parse_page_reply(&reply)?;

        tracing::debug!(url, coin = %name, price, "page extraction");
        let symbol = symbol_from_name(&name);
        CoinQuote::new(name, symbol, price)
    }

    pub async fn resolve_from_text(&self, text: &str) -> Option<CoinQuote> {
        let mentions = self.mentions(text).await;
        let Some(mention) = mentions.first() else {
            tracing::debug!("no coin mention in query");
            return None;
        };
        tracing::debug!(%mention, candidates = mentions.len(), "mention extracted");

        if let Some(quote) = self.aggregator.resolve(mention).await {
            return Some(quote);
        }
        if let Some(quote) = self.dex.resolve_mention(mention).await {
            return Some(quote);
        }
        self.web.resolve(mention).await
    }

    /// Model-extracted mentions; a failing model falls back to `$symbol` matching
    async fn mentions(&self, text: &str) -> Vec<String> {
        match self.extract(MENTION_EXTRACTION_PROMPT, text.to_string()).await {
            Ok(reply) => parse_mentions(&reply),
            Err(e) => {
                tracing::warn!(error = %e, "mention extraction failed, matching $symbols locally");
                local_mentions(text)
            }
        }
    }

    async fn extract(&self, prompt: &str, input: String) -> Result<String> {
        let messages = [Message::system(prompt), Message::user(input)];
        let completion = self.llm.complete(&messages, &self.options).await?;
        Ok(completion.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use crate::retry::RetryPolicy;
    use crate::test_support::ScriptedProvider;
    use advisor_core::Role;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(server: &MockServer, llm: Arc<ScriptedProvider>) -> ExtractionResolver {
        let config = ResolverConfig {
            endpoints: Endpoints::with_host(&server.uri()),
            search_api_key: Some("serp".into()),
            retry: RetryPolicy::none(),
            max_page_chars: 200,
            ..ResolverConfig::default()
        };
        let http = HttpClient::new(&config).unwrap();
        let aggregator = Arc::new(AggregatorResolver::new(http.clone(), &config));
        let dex = Arc::new(DexResolver::new(http.clone(), &config));
        ExtractionResolver::new(llm, http, &config, aggregator, dex)
    }

    #[test]
    fn test_parse_page_reply() {
        assert_eq!(
            parse_page_reply("Coin: Bitcoin, Price: 65000.12").unwrap(),
            ("Bitcoin".to_string(), 65000.12)
        );
        assert_eq!(
            parse_page_reply("  coin: Dogwifhat , price: $2,410.5 USD\n").unwrap(),
            ("Dogwifhat".to_string(), 2410.5)
        );
        assert!(matches!(parse_page_reply("none"), Err(ResolveError::ExtractionAmbiguous(_))));
        assert!(matches!(parse_page_reply("Coin: , Price: 3"), Err(ResolveError::ExtractionAmbiguous(_))));
        assert!(matches!(parse_page_reply("Coin: Pepe, Price: unknown"), Err(ResolveError::ExtractionAmbiguous(_))));
        assert!(matches!(parse_page_reply("It is Bitcoin"), Err(ResolveError::ExtractionAmbiguous(_))));
    }

    #[test]
    fn test_parse_mentions() {
        assert_eq!(parse_mentions("$BTC, $eth,$btc"), vec!["BTC", "eth"]);
        assert_eq!(parse_mentions("$bitcoin"), vec!["bitcoin"]);
        assert!(parse_mentions(" None ").is_empty());
        assert!(parse_mentions("I think it's {BTC}").is_empty());
    }

    #[test]
    fn test_local_mentions() {
        assert_eq!(local_mentions("buy $PEPE or $wif? not $5 or $PEPE"), vec!["PEPE", "wif"]);
        assert!(local_mentions("nothing here").is_empty());
    }

    #[test]
    fn test_symbol_from_name() {
        assert_eq!(symbol_from_name("Shiba Inu"), "SHIBAINU");
    }

    #[tokio::test]
    async fn test_url_extraction() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blog/post"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><h1>Why Dogwifhat?</h1><p>WIF trades at $2.41</p></body></html>",
            ))
            .mount(&server)
            .await;
        let llm = Arc::new(ScriptedProvider::with_replies(["Coin: Dogwifhat, Price: 2.41"]));

        let quote = resolver(&server, llm.clone())
            .resolve_from_url(&format!("{}/blog/post", server.uri()))
            .await
            .unwrap();

        assert_eq!(quote.name, "Dogwifhat");
        assert_eq!(quote.symbol, "DOGWIFHAT");
        assert_eq!(quote.price_usd, 2.41);
        assert_eq!(quote.change_24h_percent, None);

        let prompts = llm.prompts();
        assert_eq!(prompts[0][0].role, Role::System);
        assert_eq!(prompts[0][1].content, "Why Dogwifhat? WIF trades at $2.41");
    }

    #[tokio::test]
    async fn test_url_extraction_none_is_unresolved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Weather today: sunny</p>"))
            .mount(&server)
            .await;
        let llm = Arc::new(ScriptedProvider::with_replies(["none"]));

        let resolver = resolver(&server, llm.clone());
        assert!(resolver.resolve_from_url(&server.uri()).await.is_none());
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_text_cascade_reaches_web_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"coins": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/dex/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pairs": []})))
            .expect(4)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "MOG price usd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic_results": [{"snippet": "MOG is trading at 0.0000015 USD"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        let llm = Arc::new(ScriptedProvider::with_replies(["$MOG"]));

        let quote = resolver(&server, llm).resolve_from_text("thoughts on mog coin?").await.unwrap();
        assert_eq!(quote.symbol, "MOG");
        assert_eq!(quote.price_usd, 0.0000015);
        assert_eq!(quote.change_24h_percent, None);
    }

    #[tokio::test]
    async fn test_text_without_mentions_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let llm = Arc::new(ScriptedProvider::with_replies(["none"]));

        assert!(resolver(&server, llm).resolve_from_text("hello there").await.is_none());
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_local_mentions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/search"))
            .and(query_param("query", "BONK"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "coins": [{"id": "bonk", "name": "Bonk", "symbol": "bonk"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bonk": {"usd": 0.000021, "usd_24h_change": -3.0}
            })))
            .mount(&server)
            .await;
        let llm = Arc::new(ScriptedProvider::new());
        llm.push_failure("connection refused");

        let quote = resolver(&server, llm).resolve_from_text("is $BONK cooked").await.unwrap();
        assert_eq!(quote.name, "Bonk");
        assert_eq!(quote.change_24h_percent, Some(-3.0));
    }
}
