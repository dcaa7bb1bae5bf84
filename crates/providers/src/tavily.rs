//! Tavily web-search client.
//!
//! `POST {base_url}/search` with the request as JSON and the key as a bearer
//! token. The response's `results` and `answer` fields map directly onto
//! [`SearchResponse`]; everything else (`raw_content`, `response_time`, ...)
//! is ignored.

use async_trait::async_trait;
use researchflow_core::error::ProviderError;
use researchflow_core::search::{SearchClient, SearchRequest, SearchResponse};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Search client for the Tavily API.
pub struct TavilyClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn parse_response(body: &str) -> Result<SearchResponse, ProviderError> {
        serde_json::from_str(body)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse search response: {e}")))
    }
}

#[async_trait]
impl SearchClient for TavilyClient {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ProviderError> {
        let url = format!("{}/search", self.base_url);

        debug!(query = %request.query, depth = ?request.search_depth, max_results = request.max_results, "Sending search request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid search API key".into(),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if status != 200 {
            warn!(status, body = %text, "Search provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: text,
            });
        }

        Self::parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_properties() {
        let client = TavilyClient::new("tvly-test");
        assert_eq!(client.name(), "tavily");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);

        let custom = TavilyClient::with_base_url("http://localhost:9000/", "k");
        assert_eq!(custom.base_url, "http://localhost:9000");
    }

    #[test]
    fn request_serializes_to_provider_fields() {
        let body = serde_json::to_value(SearchRequest::advanced("rust async")).unwrap();
        assert_eq!(body["query"], "rust async");
        assert_eq!(body["search_depth"], "advanced");
        assert_eq!(body["max_results"], 5);
        assert_eq!(body["include_raw_content"], true);
        assert_eq!(body["include_answer"], true);
    }

    #[test]
    fn parse_full_response() {
        let data = r#"{
            "query": "rust async",
            "answer": "Rust async uses futures.",
            "results": [
                {"title": "Async Book", "url": "https://rust-lang.github.io/async-book/", "content": "Intro", "score": 0.92, "raw_content": "..."},
                {"title": "Tokio", "url": "https://tokio.rs", "content": "Runtime", "score": 0.81, "raw_content": null}
            ],
            "response_time": 1.2
        }"#;
        let response = TavilyClient::parse_response(data).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].title, "Async Book");
        assert!((response.results[1].score - 0.81).abs() < f64::EPSILON);
        assert_eq!(response.answer.as_deref(), Some("Rust async uses futures."));
    }

    #[test]
    fn parse_response_with_null_answer_and_no_results() {
        let response = TavilyClient::parse_response(r#"{"answer": null, "results": []}"#).unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn parse_response_rejects_garbage() {
        let err = TavilyClient::parse_response("<html>").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
