//! Fetch Client
//!
//! Sends one `GET {base_url}/search?...` per query and decodes the JSON
//! body into [`SearchResults`].
//!
//! ## Failure handling
//!
//! - Transport failures, timeouts and non-2xx statuses are network errors.
//!   They are retried according to the configured [`RetryPolicy`].
//! - A body that does not match the expected shape is a decode error and is
//!   never retried.
//! - The backend reports its own failures as `{"ret": n, "msg": "..."}`;
//!   those surface as [`SearchError::Backend`].

use crate::config::ApiConfig;
use crate::models::{ResultsJson, SearchQuery, SearchResults};
use crate::search::encoder;
use crate::utils::{with_retry, RetryPolicy};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while fetching search results
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Network(String),

    #[error("Search request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Search service returned HTTP {0}")]
    Status(u16),

    #[error("Failed to parse search results: {0}")]
    Decode(String),

    #[error("Search service error {code}: {message}")]
    Backend { code: i64, message: String },

    #[error("Invalid search service URL: {0}")]
    InvalidUrl(String),
}

impl SearchError {
    /// True for failures of the transport rather than of the payload
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SearchError::Network(_) | SearchError::Timeout(_) | SearchError::Status(_)
        )
    }

    /// Worth another attempt: transport failures and server-side statuses
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Status(code) => *code >= 500,
            other => other.is_network(),
        }
    }
}

/// Anything that can answer a search query
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError>;
}

/// Error envelope the backend sends instead of results
#[derive(Debug, Deserialize)]
struct BackendFailure {
    ret: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Results(ResultsJson),
    Failure(BackendFailure),
}

/// HTTP client for the MediSia search service
pub struct SearchClient {
    http: reqwest::Client,
    endpoint: reqwest::Url,
    timeout: Duration,
    retry: RetryPolicy,
}

impl SearchClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SearchError> {
        let endpoint = search_endpoint(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            timeout,
            retry: RetryPolicy::NONE,
        })
    }

    /// Configure client from config
    pub fn from_config(config: &ApiConfig) -> Result<Self, SearchError> {
        Ok(Self::new(&config.base_url, config.timeout)?.with_retry(config.retry_policy()))
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    /// Full request URL for `query`
    pub fn request_url(&self, query: &SearchQuery) -> reqwest::Url {
        let mut url = self.endpoint.clone();
        encoder::encode(query).apply_to(&mut url);
        url
    }

    /// Fetch and decode the raw JSON body, retrying network failures
    pub async fn fetch_json(&self, query: &SearchQuery) -> Result<ResultsJson, SearchError> {
        let url = self.request_url(query);
        info!(url = %url, "Searching");

        with_retry(self.retry, SearchError::is_retryable, || self.fetch_once(url.clone())).await
    }

    async fn fetch_once(&self, url: reqwest::Url) -> Result<ResultsJson, SearchError> {
        let response = self.http.get(url).send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Search service returned an error status");
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        debug!(bytes = body.len(), "Raw search response received");

        decode_body(&body)
    }

    fn transport_error(&self, error: reqwest::Error) -> SearchError {
        if error.is_timeout() {
            SearchError::Timeout(self.timeout)
        } else {
            SearchError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl SearchBackend for SearchClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        let json = self.fetch_json(query).await?;
        let results = SearchResults::from(json);
        info!(count = results.papers.len(), "Search completed");
        Ok(results)
    }
}

/// Parse a `/search` response body
pub fn decode_body(body: &[u8]) -> Result<ResultsJson, SearchError> {
    match serde_json::from_slice::<SearchResponse>(body) {
        Ok(SearchResponse::Results(json)) => Ok(json),
        Ok(SearchResponse::Failure(failure)) => Err(SearchError::Backend {
            code: failure.ret,
            message: failure.msg,
        }),
        Err(e) => Err(SearchError::Decode(e.to_string())),
    }
}

fn search_endpoint(base_url: &str) -> Result<reqwest::Url, SearchError> {
    let base = reqwest::Url::parse(base_url.trim())
        .map_err(|e| SearchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    if base.cannot_be_a_base() {
        return Err(SearchError::InvalidUrl(base_url.to_string()));
    }

    let path = format!("{}/search", base.path().trim_end_matches('/'));
    let mut endpoint = base;
    endpoint.set_path(&path);
    endpoint.set_query(None);
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_endpoint() {
        assert_eq!(
            search_endpoint("http://127.0.0.1:8000").unwrap().as_str(),
            "http://127.0.0.1:8000/search"
        );
        assert_eq!(
            search_endpoint("https://medisia.example/api/").unwrap().as_str(),
            "https://medisia.example/api/search"
        );
        assert!(matches!(
            search_endpoint("not a url"),
            Err(SearchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_request_url_carries_encoded_query() {
        let client = SearchClient::new("http://localhost:8000", Duration::from_secs(1)).unwrap();
        let url = client.request_url(&SearchQuery::term("sepsis"));
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/search?query=sepsis&type=new&deep=False"
        );
    }

    #[test]
    fn test_decode_results() {
        let body = br#"{"categories":["medicine"],"journals":["BMJ"],"pubyears":[2020],
            "results":[{"title":"T","year":2020,"journal_name":"BMJ","category":"medicine"}]}"#;
        let json = decode_body(body).unwrap();
        assert_eq!(json.results.len(), 1);
        assert_eq!(json.pubyears, vec![2020]);
    }

    #[test]
    fn test_decode_backend_failure() {
        let body = br#"{"ret": 2, "msg": "unexpected error"}"#;
        match decode_body(body) {
            Err(SearchError::Backend { code, message }) => {
                assert_eq!(code, 2);
                assert_eq!(message, "unexpected error");
            }
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_body(b"<html>"), Err(SearchError::Decode(_))));
        assert!(matches!(
            decode_body(br#"{"results": "nope"}"#),
            Err(SearchError::Decode(_))
        ));
    }

    #[test]
    fn test_network_classification() {
        assert!(SearchError::Timeout(Duration::from_secs(1)).is_network());
        assert!(SearchError::Status(502).is_network());
        assert!(!SearchError::Decode("x".into()).is_network());
        assert!(!SearchError::Backend { code: 1, message: "m".into() }.is_network());

        assert!(SearchError::Status(503).is_retryable());
        assert!(!SearchError::Status(404).is_retryable());
        assert!(SearchError::Network("refused".into()).is_retryable());
    }
}
