//! Web-Search Fallback
//!
//! Last resort for bare mentions: search the web, concatenate the result
//! snippets and take the first number as the price. Low confidence; the
//! 24h change is never reported on this path.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::config::ResolverConfig;
use crate::error::{degrade, ResolveError, Result};
use crate::http::HttpClient;
use crate::model::CoinQuote;

#[derive(Debug, Default, Deserialize)]
struct SearchResults {
    #[serde(default)]
    answer_box: Option<Snippet>,
    #[serde(default)]
    organic_results: Vec<Snippet>,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    snippet: Option<String>,
}

#[allow(clippy::expect_used)] // pattern is constant
fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("number regex is valid"))
}

/// First numeric substring, thousands separators removed
pub(crate) fn first_number(text: &str) -> Option<f64> {
    let raw = number_regex().find(text)?.as_str().replace(',', "");
    raw.parse().ok()
}

pub struct WebSearchResolver {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl WebSearchResolver {
    pub fn new(http: HttpClient, config: &ResolverConfig) -> Self {
        Self {
            http,
            base_url: config.endpoints.search_base.clone(),
            api_key: config.search_api_key.clone(),
        }
    }

    pub async fn resolve(&self, mention: &str) -> Option<CoinQuote> {
        degrade("web-search", mention, self.try_resolve(mention).await)
    }

    async fn try_resolve(&self, mention: &str) -> Result<CoinQuote> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ResolveError::NotFound("web search disabled, no API key".into()));
        };
        let mention = mention.trim().trim_start_matches('$');
        let query = format!("{} price usd", mention);

        let results: SearchResults = self
            .http
            .get_json(
                &self.base_url,
                &[("q", query.as_str()), ("api_key", api_key), ("engine", "google")],
                HeaderMap::new(),
            )
            .await?;

        let snippets: Vec<String> = results
            .answer_box
            .into_iter()
            .chain(results.organic_results)
            .filter_map(|s| s.snippet)
            .collect();
        let text = snippets.join(" ");

        let price = first_number(&text)
            .ok_or_else(|| ResolveError::NotFound(format!("no price in snippets for {}", mention)))?;
        tracing::debug!(mention, price, snippets = snippets.len(), "price taken from search snippets");

        CoinQuote::new(mention, mention, price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use crate::retry::RetryPolicy;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(server: &MockServer, api_key: Option<&str>) -> WebSearchResolver {
        let config = ResolverConfig {
            endpoints: Endpoints::with_host(&server.uri()),
            search_api_key: api_key.map(str::to_string),
            retry: RetryPolicy::none(),
            ..ResolverConfig::default()
        };
        WebSearchResolver::new(HttpClient::new(&config).unwrap(), &config)
    }

    #[test]
    fn test_first_number() {
        assert_eq!(first_number("MOG trades at $0.0000015 today"), Some(0.0000015));
        assert_eq!(first_number("price: 1,234.50 USD, up 3%"), Some(1234.5));
        assert_eq!(first_number("no digits here"), None);
    }

    #[tokio::test]
    async fn test_snippets_are_concatenated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "mog price usd"))
            .and(query_param("api_key", "serp"))
            .and(query_param("engine", "google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic_results": [
                    {"title": "Mog Coin", "snippet": "Mog Coin is a memecoin."},
                    {"title": "MOG price", "snippet": "The live price is $0.0000015 USD."}
                ]
            })))
            .mount(&server)
            .await;

        let quote = resolver(&server, Some("serp")).resolve("$mog").await.unwrap();
        assert_eq!(quote.symbol, "MOG");
        assert_eq!(quote.price_usd, 0.0000015);
        assert_eq!(quote.change_24h_percent, None);
    }

    #[tokio::test]
    async fn test_without_key_no_request_is_made() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(resolver(&server, None).resolve("mog").await.is_none());
    }
}
