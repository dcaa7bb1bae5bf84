//! SearchClient trait: the abstraction over web-search providers.
//!
//! The research stage issues one [`SearchRequest`] per attempt and gets back
//! the provider's raw hits plus an optional aggregated answer. Mapping those
//! into [`crate::ResearchRecord`]s is the caller's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// How much effort the provider should spend per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    Advanced,
}

/// A search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub search_depth: SearchDepth,
    pub max_results: u32,
    pub include_raw_content: bool,
    pub include_answer: bool,
}

impl SearchRequest {
    /// The fixed request the research stage sends: advanced depth, five
    /// hits, raw content and the aggregated answer included.
    pub fn advanced(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_depth: SearchDepth::Advanced,
            max_results: 5,
            include_raw_content: true,
            include_answer: true,
        }
    }
}

/// One raw hit as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub url: String,

    #[serde(default = "default_title")]
    pub title: String,

    /// Provider relevance score, nominally in [0, 1]
    #[serde(default)]
    pub score: f64,
}

fn default_title() -> String {
    "No title".into()
}

/// The provider's response to one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,

    /// Aggregated direct answer, when the provider produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl SearchResponse {
    /// True when neither hits nor a direct answer came back.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.answer.as_deref().is_none_or(str::is_empty)
    }
}

/// The core SearchClient trait.
///
/// Every web-search backend implements this. Errors are returned, never
/// swallowed; the research stage decides how to recover.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// A human-readable name for this backend (e.g., "tavily").
    fn name(&self) -> &str;

    /// Execute one search request.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ProviderError>;
}
