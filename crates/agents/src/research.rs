//! Research stage: search, normalize, and the one spelling retry.
//!
//! # Flow
//!
//! 1. Search with the query as given
//! 2. Map every hit (plus the direct answer, if any) to a record
//! 3. Nothing came back and the query mentions "travily"? Search once more
//!    with "tavily" substituted, and annotate a successful retry
//!
//! A failed search is logged and counts as an empty attempt.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex_lite::Regex;
use researchflow_core::event::{DomainEvent, EventBus};
use researchflow_core::research::ResearchRecord;
use researchflow_core::search::{SearchClient, SearchRequest, SearchResponse};
use tracing::{debug, info, warn};

const MISSPELLING: &str = "(?i)travily";
const CORRECTION: &str = "tavily";

/// Runs the search side of a pipeline run.
pub struct ResearchAgent {
    client: Arc<dyn SearchClient>,
    event_bus: Option<Arc<EventBus>>,
}

impl ResearchAgent {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self {
            client,
            event_bus: None,
        }
    }

    /// Publish a `SearchExecuted` event for every attempt.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Search for `query`. Never fails; an empty result is a soft failure
    /// for the downstream stages to handle.
    pub async fn run(&self, query: &str) -> Vec<ResearchRecord> {
        let records = self.attempt(query, false).await;
        if !records.is_empty() {
            return records;
        }

        let Some(corrected) = corrected_query(query) else {
            info!(query = %query, "Search returned no results");
            return records;
        };

        info!(original = %query, corrected = %corrected, "Retrying search with corrected spelling");
        let mut retried = self.attempt(&corrected, true).await;
        if retried.is_empty() {
            info!(query = %corrected, "Corrected search returned no results");
        } else {
            retried.push(ResearchRecord::search_note(query, &corrected));
        }
        retried
    }

    async fn attempt(&self, query: &str, retry: bool) -> Vec<ResearchRecord> {
        let request = SearchRequest::advanced(query);
        let records = match self.client.search(&request).await {
            Ok(response) => to_records(response, query),
            Err(e) => {
                warn!(query = %query, client = self.client.name(), error = %e, "Search failed");
                Vec::new()
            }
        };

        debug!(query = %query, records = records.len(), retry, "Search attempt finished");
        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::SearchExecuted {
                query: query.to_string(),
                records: records.len(),
                retry,
                timestamp: Utc::now(),
            });
        }
        records
    }
}

/// Normalize one search response, every record tagged with `query_used`.
/// The direct answer, when present, comes after the hits.
pub fn to_records(response: SearchResponse, query_used: &str) -> Vec<ResearchRecord> {
    let mut records: Vec<ResearchRecord> = response
        .results
        .into_iter()
        .map(|hit| ResearchRecord::from_hit(hit, query_used))
        .collect();

    if let Some(answer) = response.answer.filter(|a| !a.trim().is_empty()) {
        records.push(ResearchRecord::direct_answer(answer, query_used));
    }
    records
}

/// The lowercased query with every "travily" replaced by "tavily", or
/// `None` when there is nothing to correct.
pub fn corrected_query(query: &str) -> Option<String> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(MISSPELLING).ok()).as_ref()?;
    re.is_match(query)
        .then(|| re.replace_all(&query.to_lowercase(), CORRECTION).into_owned())
}
