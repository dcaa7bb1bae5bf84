//! Run results and where their artifacts go.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use researchflow_core::research::Report;
use serde::{Deserialize, Serialize};

/// The outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    /// The report text, or the failure explanation
    pub answer: String,
    /// The written document, or the error artifact
    pub path: PathBuf,
    /// Number of cited sources
    pub sources: usize,
    /// Whether the document carries a reliability chart
    pub visualization: bool,
    pub query_variations: Vec<String>,
}

impl PipelineResult {
    pub fn success(report: &Report, path: PathBuf, visualization: bool) -> Self {
        Self {
            success: true,
            answer: report.answer.clone(),
            path,
            sources: report.sources.len(),
            visualization,
            query_variations: report.query_variations.clone(),
        }
    }

    pub fn failure(artifact: PathBuf) -> Self {
        Self {
            success: false,
            answer: format!("Research failed. Error report saved to {}", artifact.display()),
            path: artifact,
            sources: 0,
            visualization: false,
            query_variations: Vec::new(),
        }
    }
}

/// File naming under the output directory. Every artifact of a run shares
/// the run's timestamp.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    dir: PathBuf,
}

impl OutputLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if needed.
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    /// `%Y%m%d_%H%M%S` in local time.
    pub fn stamp(at: DateTime<Local>) -> String {
        at.format("%Y%m%d_%H%M%S").to_string()
    }

    pub fn chart(&self, stamp: &str) -> PathBuf {
        self.dir.join(format!("reliability_{stamp}.png"))
    }

    pub fn report(&self, stamp: &str) -> PathBuf {
        self.dir.join(format!("report_{stamp}.docx"))
    }

    pub fn markdown(&self, stamp: &str) -> PathBuf {
        self.dir.join(format!("report_{stamp}.md"))
    }

    pub fn json(&self, stamp: &str) -> PathBuf {
        self.dir.join(format!("report_{stamp}.json"))
    }

    pub fn sources_csv(&self, stamp: &str) -> PathBuf {
        self.dir.join(format!("sources_{stamp}.csv"))
    }

    pub fn error_report(&self, stamp: &str) -> PathBuf {
        self.dir.join(format!("error_report_{stamp}.txt"))
    }

    pub fn gallery(&self, stamp: &str) -> PathBuf {
        self.dir.join(format!("visualizations_{stamp}.docx"))
    }
}

/// Text of the fallback artifact written when a run fails.
pub fn error_report_text(query: &str, error: &str) -> String {
    format!(
        "Research failed for query: {query}\n\
         Error: {error}\n\
         \n\
         Suggestions:\n\
         - Check your query spelling\n\
         - Verify your API keys are valid\n\
         - Check your internet connection\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use researchflow_core::research::Source;

    #[test]
    fn artifact_names_share_stamp() {
        let at = Local.with_ymd_and_hms(2026, 7, 4, 18, 5, 9).unwrap();
        let stamp = OutputLayout::stamp(at);
        assert_eq!(stamp, "20260704_180509");

        let layout = OutputLayout::new("out");
        assert_eq!(layout.chart(&stamp), Path::new("out/reliability_20260704_180509.png"));
        assert_eq!(layout.report(&stamp), Path::new("out/report_20260704_180509.docx"));
        assert_eq!(layout.markdown(&stamp), Path::new("out/report_20260704_180509.md"));
        assert_eq!(layout.json(&stamp), Path::new("out/report_20260704_180509.json"));
        assert_eq!(layout.sources_csv(&stamp), Path::new("out/sources_20260704_180509.csv"));
        assert_eq!(
            layout.gallery(&stamp),
            Path::new("out/visualizations_20260704_180509.docx")
        );
        assert_eq!(
            layout.error_report(&stamp),
            Path::new("out/error_report_20260704_180509.txt")
        );
    }

    #[test]
    fn ensure_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("a").join("b"));
        layout.ensure().unwrap();
        assert!(layout.dir().is_dir());
    }

    #[test]
    fn error_report_lines() {
        let text = error_report_text("climate policy", "No report generated");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Research failed for query: climate policy",
                "Error: No report generated",
                "",
                "Suggestions:",
                "- Check your query spelling",
                "- Verify your API keys are valid",
                "- Check your internet connection",
            ]
        );
    }

    #[test]
    fn result_constructors() {
        let report = Report {
            question: "q".into(),
            answer: "# Findings".into(),
            sources: vec![Source {
                id: 1,
                url: "https://a".into(),
                title: "A".into(),
                score: 0.9,
                query_used: "q".into(),
            }],
            query_variations: vec!["q".into()],
        };
        let ok = PipelineResult::success(&report, PathBuf::from("r.docx"), true);
        assert!(ok.success);
        assert_eq!(ok.sources, 1);
        assert!(ok.visualization);

        let failed = PipelineResult::failure(PathBuf::from("out/error_report_x.txt"));
        assert!(!failed.success);
        assert_eq!(failed.sources, 0);
        assert!(!failed.visualization);
        assert!(failed.query_variations.is_empty());
        assert_eq!(
            failed.answer,
            "Research failed. Error report saved to out/error_report_x.txt"
        );
    }
}
