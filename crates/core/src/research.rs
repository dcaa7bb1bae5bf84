//! Research records and the drafted report.
//!
//! A [`ResearchRecord`] is one normalized search hit tagged with the query
//! that produced it. Records are immutable once built; every constructor
//! enforces the record invariants (score in [0, 1], title at most
//! [`MAX_TITLE_CHARS`] characters).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::search::SearchHit;

/// Answer prefix of a report degraded by a drafting error.
pub const DEGRADED_PREFIX: &str = "Error generating report: ";

/// Longest title a record keeps, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Title of the synthetic record built from the provider's aggregated answer.
pub const DIRECT_ANSWER_TITLE: &str = "Direct Answer";

/// Title of the synthetic record that announces a spelling correction.
pub const SEARCH_NOTE_TITLE: &str = "Search Note";

/// One normalized search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub content: String,
    /// Empty for synthetic records
    pub url: String,
    pub title: String,
    pub score: f64,
    /// The query text actually sent to the search provider
    pub query_used: String,
}

impl ResearchRecord {
    /// Normalize a provider hit.
    pub fn from_hit(hit: SearchHit, query_used: &str) -> Self {
        Self {
            content: hit.content,
            url: hit.url,
            title: truncate_chars(&hit.title, MAX_TITLE_CHARS),
            score: clamp_score(hit.score),
            query_used: query_used.to_string(),
        }
    }

    /// The provider's aggregated answer as a record without a URL.
    pub fn direct_answer(answer: impl Into<String>, query_used: &str) -> Self {
        Self {
            content: answer.into(),
            url: String::new(),
            title: DIRECT_ANSWER_TITLE.into(),
            score: 1.0,
            query_used: query_used.to_string(),
        }
    }

    /// Annotation appended after a successful spelling-corrected retry.
    pub fn search_note(original: &str, corrected: &str) -> Self {
        Self {
            content: format!(
                "Note: Original query was '{original}'. Showing results for '{corrected}'"
            ),
            url: String::new(),
            title: SEARCH_NOTE_TITLE.into(),
            score: 0.5,
            query_used: corrected.to_string(),
        }
    }

    /// Whether this record can appear in a citation list.
    pub fn is_citable(&self) -> bool {
        !self.url.is_empty()
    }
}

/// A cited source in the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// 1-based position among citable records
    pub id: usize,
    pub url: String,
    pub title: String,
    pub score: f64,
    pub query_used: String,
}

impl Source {
    /// Build the citation list: citable records only, numbered from 1 in
    /// record order.
    pub fn collect(records: &[ResearchRecord]) -> Vec<Source> {
        records
            .iter()
            .filter(|r| r.is_citable())
            .enumerate()
            .map(|(i, r)| Source {
                id: i + 1,
                url: r.url.clone(),
                title: r.title.clone(),
                score: r.score,
                query_used: r.query_used.clone(),
            })
            .collect()
    }
}

/// The drafted research report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub question: String,
    /// Markdown body
    pub answer: String,
    pub sources: Vec<Source>,
    /// Distinct query texts, in first-seen order
    pub query_variations: Vec<String>,
}

impl Report {
    /// A report whose answer explains why drafting failed.
    pub fn degraded(question: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            question: question.into(),
            answer: format!("{DEGRADED_PREFIX}{error}"),
            sources: Vec::new(),
            query_variations: Vec::new(),
        }
    }

    /// The drafting error carried by a degraded report.
    pub fn degradation(&self) -> Option<&str> {
        if !self.sources.is_empty() {
            return None;
        }
        self.answer.strip_prefix(DEGRADED_PREFIX)
    }

    /// Whether the report has an answer worth exporting.
    pub fn has_answer(&self) -> bool {
        !self.answer.is_empty()
    }
}

/// Distinct `query_used` values across records, in first-seen order.
pub fn query_variations(records: &[ResearchRecord]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for record in records {
        if !seen.iter().any(|q| q == &record.query_used) {
            seen.push(record.query_used.clone());
        }
    }
    seen
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

/// Keep at most `max` characters (never splits a code point).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
