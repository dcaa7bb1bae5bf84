//! Draft stage: one generation call turns the records into a report.

use std::sync::Arc;

use researchflow_core::error::{Error, Result};
use researchflow_core::message::Message;
use researchflow_core::provider::{Provider, ProviderRequest};
use researchflow_core::research::{Report, ResearchRecord, Source, query_variations};
use tracing::{error, info};

pub const SYSTEM_PROMPT: &str = "You are a professional research analyst. \
Write clear, well-structured reports grounded only in the research data you are given.";

/// Drafts the research report with a generation model.
pub struct DraftAgent {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl DraftAgent {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Draft a report, or fail.
    ///
    /// Errors with [`Error::Precondition`] on empty `records`, and with the
    /// provider's error if generation fails. Sources are numbered from the
    /// records, never from the model's citations.
    pub async fn draft(&self, query: &str, records: &[ResearchRecord]) -> Result<Report> {
        if records.is_empty() {
            return Err(Error::Precondition("No research data provided".into()));
        }

        let query_variations = query_variations(records);
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(build_prompt(query, records, &query_variations)?),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        info!(model = %self.model, records = records.len(), "Generating research report");
        let response = self.provider.complete(request).await?;

        Ok(Report {
            question: query.to_string(),
            answer: response.message.content,
            sources: Source::collect(records),
            query_variations,
        })
    }

    /// Draft a report; any failure becomes a degraded report whose answer
    /// explains the error.
    pub async fn generate_report(&self, query: &str, records: &[ResearchRecord]) -> Report {
        match self.draft(query, records).await {
            Ok(report) => report,
            Err(e) => {
                error!(query = %query, error = %e, "Report generation failed");
                Report::degraded(query, e)
            }
        }
    }
}

/// The user prompt: question, records as pretty JSON, and the required
/// report structure.
pub fn build_prompt(query: &str, records: &[ResearchRecord], variations: &[String]) -> Result<String> {
    let data = serde_json::to_string_pretty(records)?;
    let searched = if variations.len() > 1 {
        format!("\nQueries searched: {}\n", variations.join(", "))
    } else {
        String::new()
    };

    Ok(format!(
        "Create a comprehensive research report based on these inputs:

Original Research Question: {query}
{searched}
Research Data:
{data}

Structure your report with:
1. Executive Summary (include note about any query variations)
2. Key Findings (bullet points)
3. Detailed Analysis
4. Conclusion
5. Sources

Note any query variations in the Executive Summary if applicable.
Use markdown formatting and cite sources as [Source 1], [Source 2], etc."
    ))
}
