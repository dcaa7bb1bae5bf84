//! Pipeline state and the patches stages return.
//!
//! Stages never touch the state directly. Each one reads what it needs and
//! returns a [`StatePatch`]; the orchestrator folds patches into the state
//! with [`PipelineState::apply`].

use std::fmt;
use std::path::PathBuf;

use researchflow_core::research::{Report, ResearchRecord};
use serde::{Deserialize, Serialize};

/// A pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Research,
    Visualize,
    Draft,
    Export,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Visualize => "visualize",
            Self::Draft => "draft",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a run knows so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineState {
    pub query: String,
    pub research_results: Vec<ResearchRecord>,
    pub visualization_path: Option<PathBuf>,
    pub report: Option<Report>,
    /// Error reported by the most recent stage, if any
    pub error: Option<String>,
}

impl PipelineState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Merge a patch. Fields the patch leaves unset keep their value.
    pub fn apply(self, patch: StatePatch) -> Self {
        Self {
            query: self.query,
            research_results: patch.research_results.unwrap_or(self.research_results),
            visualization_path: patch.visualization_path.unwrap_or(self.visualization_path),
            report: patch.report.or(self.report),
            error: patch.error.unwrap_or(self.error),
        }
    }
}

/// A partial update to [`PipelineState`].
///
/// `None` means "leave unchanged". The optional state fields are wrapped
/// twice so a patch can also clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub research_results: Option<Vec<ResearchRecord>>,
    pub visualization_path: Option<Option<PathBuf>>,
    pub report: Option<Report>,
    pub error: Option<Option<String>>,
}

impl StatePatch {
    pub fn with_research_results(mut self, records: Vec<ResearchRecord>) -> Self {
        self.research_results = Some(records);
        self
    }

    pub fn with_visualization(mut self, path: Option<PathBuf>) -> Self {
        self.visualization_path = Some(path);
        self
    }

    pub fn with_report(mut self, report: Report) -> Self {
        self.report = Some(report);
        self
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    /// The error this patch sets, if it sets one.
    pub fn stage_error(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str) -> ResearchRecord {
        ResearchRecord::direct_answer(url, "q")
    }

    #[test]
    fn new_state_is_empty() {
        let state = PipelineState::new("climate policy");
        assert_eq!(state.query, "climate policy");
        assert!(state.research_results.is_empty());
        assert!(state.visualization_path.is_none());
        assert!(state.report.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let state = PipelineState::new("q").apply(
            StatePatch::default()
                .with_research_results(vec![record("a")])
                .with_error(Some("boom".into())),
        );
        let same = state.clone().apply(StatePatch::default());
        assert_eq!(same, state);
    }

    #[test]
    fn patches_merge_in_order() {
        let state = PipelineState::new("q")
            .apply(
                StatePatch::default()
                    .with_research_results(vec![record("a"), record("b")])
                    .with_error(None),
            )
            .apply(
                StatePatch::default()
                    .with_visualization(Some(PathBuf::from("chart.png")))
                    .with_error(None),
            )
            .apply(StatePatch::default().with_report(Report::degraded("q", "text")));

        assert_eq!(state.research_results.len(), 2);
        assert_eq!(state.visualization_path, Some(PathBuf::from("chart.png")));
        assert_eq!(state.report.unwrap().answer, "Error generating report: text");
        assert!(state.error.is_none());
    }

    #[test]
    fn patch_can_clear_optional_fields() {
        let state = PipelineState::new("q")
            .apply(
                StatePatch::default()
                    .with_visualization(Some(PathBuf::from("chart.png")))
                    .with_error(Some("No research data found".into())),
            )
            .apply(StatePatch::default().with_visualization(None).with_error(None));

        assert!(state.visualization_path.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn stage_error_reads_through_both_options() {
        assert_eq!(StatePatch::default().stage_error(), None);
        assert_eq!(StatePatch::default().with_error(None).stage_error(), None);
        assert_eq!(
            StatePatch::default()
                .with_error(Some("x".into()))
                .stage_error(),
            Some("x")
        );
    }

    #[test]
    fn stage_names() {
        let names: Vec<_> = [Stage::Research, Stage::Visualize, Stage::Draft, Stage::Export]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["research", "visualize", "draft", "export"]);
    }
}
