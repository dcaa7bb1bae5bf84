//! Visualization stage: the source reliability chart.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;
use researchflow_core::render::{
    Block, ChartBar, ChartRenderer, DocumentWriter, ReliabilityChart, ReliabilityTier,
    ReportDocument, TextRun,
};
use researchflow_core::research::{ResearchRecord, truncate_chars};
use tracing::{error, info, warn};

/// Longest axis label before it is cut and suffixed with "...".
pub const LABEL_CHARS: usize = 25;

const GALLERY_TITLE: &str = "Research Visualizations";
const GALLERY_IMAGE_WIDTH: f64 = 6.0;

/// Builds reliability charts and hands them to a [`ChartRenderer`].
pub struct VisualizationAgent {
    renderer: Arc<dyn ChartRenderer>,
    title: String,
    x_label: String,
    /// Every chart written so far, oldest first
    charts: Mutex<Vec<PathBuf>>,
}

impl VisualizationAgent {
    pub fn new(
        renderer: Arc<dyn ChartRenderer>,
        title: impl Into<String>,
        x_label: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            title: title.into(),
            x_label: x_label.into(),
            charts: Mutex::new(Vec::new()),
        }
    }

    /// The chart model for `records`: one bar per record, in record order.
    pub fn reliability_chart(&self, records: &[ResearchRecord]) -> ReliabilityChart {
        ReliabilityChart {
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            bars: records
                .iter()
                .map(|r| ChartBar {
                    label: chart_label(&r.title),
                    score: r.score,
                    tier: ReliabilityTier::from_score(r.score),
                })
                .collect(),
        }
    }

    /// Render the reliability chart to `path`.
    ///
    /// Returns `None` (and logs) when there are no records or the backend
    /// fails; never errors.
    pub fn plot_reliability(&self, records: &[ResearchRecord], path: &Path) -> Option<PathBuf> {
        if records.is_empty() {
            warn!("No research records to visualize");
            return None;
        }

        let chart = self.reliability_chart(records);
        match self.renderer.render(&chart, path) {
            Ok(()) => {
                info!(path = %path.display(), bars = chart.bars.len(), "Reliability chart saved");
                self.charts
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(path.to_path_buf());
                Some(path.to_path_buf())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Chart rendering failed");
                None
            }
        }
    }

    /// Charts produced so far.
    pub fn charts(&self) -> Vec<PathBuf> {
        self.charts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Collect every chart produced so far into one document, one chart
    /// per page.
    pub fn gallery(&self) -> Option<ReportDocument> {
        let charts = self.charts();
        if charts.is_empty() {
            return None;
        }

        let mut doc = ReportDocument::new();
        doc.push(Block::Title(GALLERY_TITLE.into()));
        doc.push(Block::Paragraph(vec![
            TextRun::bold("Generated on: "),
            TextRun::plain(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        ]));
        for chart in charts {
            let name = chart
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| chart.display().to_string());
            doc.push(Block::Heading { level: 2, text: name });
            doc.push(Block::Image {
                path: chart,
                width_inches: GALLERY_IMAGE_WIDTH,
            });
            doc.push(Block::PageBreak);
        }
        Some(doc)
    }

    /// Write the chart gallery. `false` when there is nothing to save or
    /// the writer fails.
    pub fn save_gallery(&self, writer: &dyn DocumentWriter, path: &Path) -> bool {
        let Some(doc) = self.gallery() else {
            warn!("No visualizations to save");
            return false;
        };
        match writer.write(&doc, path) {
            Ok(()) => {
                info!(path = %path.display(), "Visualizations saved");
                true
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to save visualizations");
                false
            }
        }
    }
}

/// Axis label for a record title.
pub fn chart_label(title: &str) -> String {
    if title.chars().count() > LABEL_CHARS {
        format!("{}...", truncate_chars(title, LABEL_CHARS))
    } else {
        title.to_string()
    }
}
