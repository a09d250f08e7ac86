//! HTTP Plumbing
//!
//! Shared `reqwest` client plus the per-call retry policy. The client's
//! connection pool is safe to reuse across concurrent requests.

use reqwest::{header::HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::retry::{retry_if, RetryPolicy};

#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("coin-resolver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResolveError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            retry: config.retry,
        })
    }

    /// GET a JSON document, retrying transient failures
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
    ) -> Result<T> {
        let body = self.get_body(url, query, headers).await?;
        serde_json::from_str(&body)
            .map_err(|e| ResolveError::MalformedResponse(format!("{}: {}", url, e)))
    }

    /// GET a response body as text, retrying transient failures
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.get_body(url, &[], HeaderMap::new()).await
    }

    async fn get_body(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
    ) -> Result<String> {
        retry_if(
            self.retry,
            |attempt| {
                let request = self.client.get(url).query(query).headers(headers.clone());
                async move {
                    tracing::trace!(url, attempt, "GET");
                    let resp = request.send().await.map_err(classify_send_error)?;
                    let status = resp.status();
                    if let Some(err) = classify_status(status, url) {
                        return Err(err);
                    }
                    resp.text().await.map_err(|e| {
                        ResolveError::Transient(format!("{}: reading body: {}", url, e))
                    })
                }
            },
            ResolveError::is_retryable,
        )
        .await
    }
}

fn classify_send_error(err: reqwest::Error) -> ResolveError {
    if err.is_timeout() || err.is_connect() {
        ResolveError::Transient(err.to_string())
    } else {
        ResolveError::Network(err)
    }
}

/// Map a non-success status to the pipeline's error taxonomy
fn classify_status(status: StatusCode, url: &str) -> Option<ResolveError> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND {
        Some(ResolveError::NotFound(url.to_string()))
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Some(ResolveError::Transient(format!("{} returned {}", url, status)))
    } else {
        Some(ResolveError::Rejected {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> HttpClient {
        let config = ResolverConfig {
            retry: RetryPolicy::new(3, Duration::from_millis(1)),
            ..ResolverConfig::default()
        };
        HttpClient::new(&config).unwrap()
    }

    #[test]
    fn test_status_classification() {
        assert!(classify_status(StatusCode::OK, "u").is_none());
        assert!(matches!(classify_status(StatusCode::NOT_FOUND, "u"), Some(ResolveError::NotFound(_))));
        assert!(matches!(classify_status(StatusCode::BAD_GATEWAY, "u"), Some(ResolveError::Transient(_))));
        assert!(matches!(classify_status(StatusCode::TOO_MANY_REQUESTS, "u"), Some(ResolveError::Transient(_))));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "u"),
            Some(ResolveError::Rejected { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = client()
            .get_text(&format!("{}/flaky", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Transient(_)));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = client()
            .get_text(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bad_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client()
            .get_json::<serde_json::Value>(&format!("{}/json", server.uri()), &[], HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::MalformedResponse(_)));
    }
}
