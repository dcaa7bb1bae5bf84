//! The pipeline orchestrator.
//!
//! ```text
//! Start → Research → Visualize → Draft ─┬─ answer?  → Export → Success
//!                                       └─ no answer / any error → Failure
//! ```
//!
//! Every stage runs after its predecessor even if that one recorded an
//! error; the stages check their own preconditions. Anything that escapes
//! lands in [`PipelineOrchestrator::run`], which writes the fallback
//! artifact and returns a failure result instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, Utc};
use researchflow_agents::{DraftAgent, ExportAgent, ResearchAgent, VisualizationAgent};
use researchflow_config::AppConfig;
use researchflow_core::error::{Error, Result};
use researchflow_core::event::{DomainEvent, EventBus};
use researchflow_core::provider::Provider;
use researchflow_core::research::Report;
use researchflow_core::search::SearchClient;
use researchflow_render::{DocxWriter, PlottersChartRenderer};
use tracing::{error, info, warn};

use crate::output::{OutputLayout, PipelineResult, error_report_text};
use crate::state::{PipelineState, Stage, StatePatch};

/// Sequences the stages of one research run.
pub struct PipelineOrchestrator {
    research: ResearchAgent,
    visualize: VisualizationAgent,
    draft: DraftAgent,
    export: ExportAgent,
    layout: OutputLayout,
    json_sidecar: bool,
    event_bus: Arc<EventBus>,
}

impl PipelineOrchestrator {
    pub fn new(
        research: ResearchAgent,
        visualize: VisualizationAgent,
        draft: DraftAgent,
        export: ExportAgent,
        layout: OutputLayout,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            research,
            visualize,
            draft,
            export,
            layout,
            json_sidecar: false,
            event_bus,
        }
    }

    /// Wire the stages from configuration with the plotters and docx
    /// backends.
    pub fn from_config(
        config: &AppConfig,
        generation: Arc<dyn Provider>,
        search: Arc<dyn SearchClient>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mut chart = PlottersChartRenderer::new(config.chart.width, config.chart.height);
        if let Some(font) = &config.chart.font_path {
            chart = chart.with_font(font);
        }
        let writer = Arc::new(DocxWriter::new());

        Self::new(
            ResearchAgent::new(search).with_event_bus(event_bus.clone()),
            VisualizationAgent::new(Arc::new(chart), &config.chart.title, &config.chart.x_label),
            DraftAgent::new(generation, &config.generation.model, config.generation.temperature)
                .with_max_tokens(config.generation.max_tokens),
            ExportAgent::new(writer, &config.document.title, config.document.image_width_inches),
            OutputLayout::new(&config.output_dir),
            event_bus,
        )
        .with_json_sidecar(config.document.json_sidecar)
    }

    /// Also write `report_<ts>.json` and `sources_<ts>.csv` next to the
    /// document.
    pub fn with_json_sidecar(mut self, enabled: bool) -> Self {
        self.json_sidecar = enabled;
        self
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn visualization(&self) -> &VisualizationAgent {
        &self.visualize
    }

    pub fn exporter(&self) -> &ExportAgent {
        &self.export
    }

    /// Run the pipeline for `query`. Never fails: errors become a failure
    /// result pointing at the written error artifact.
    pub async fn run(&self, query: &str) -> PipelineResult {
        info!(query = %query, "Starting pipeline");
        let stamp = OutputLayout::stamp(Local::now());

        match self.execute(query, &stamp).await {
            Ok(result) => {
                info!(query = %query, path = %result.path.display(), sources = result.sources, "Pipeline finished");
                result
            }
            Err(e) => self.fail(query, &e, &stamp),
        }
    }

    /// Run research, visualize and draft, and return the final state.
    /// Export runs afterwards, and only for a report with an answer.
    pub async fn run_stages(&self, query: &str, stamp: &str) -> PipelineState {
        let state = PipelineState::new(query);

        let patch = self.step(Stage::Research, query, self.research_node(&state)).await;
        let state = state.apply(patch);

        let chart = self.layout.chart(stamp);
        let patch = self
            .step(Stage::Visualize, query, async { self.visualize_node(&state, &chart) })
            .await;
        let state = state.apply(patch);

        let patch = self.step(Stage::Draft, query, self.draft_node(&state)).await;
        state.apply(patch)
    }

    /// Run one node between its started and completed events.
    async fn step(
        &self,
        stage: Stage,
        query: &str,
        node: impl Future<Output = StatePatch>,
    ) -> StatePatch {
        self.publish_started(stage, query);
        let started = Instant::now();
        let patch = node.await;
        self.publish_completed(stage, started, patch.stage_error().map(str::to_string));
        patch
    }

    /// Write every chart of this session to `visualizations_<ts>.docx`.
    /// `None` when no chart was produced or the write failed.
    pub fn save_gallery(&self) -> Option<PathBuf> {
        let path = self.layout.gallery(&OutputLayout::stamp(Local::now()));
        self.visualize
            .save_gallery(self.export.writer(), &path)
            .then_some(path)
    }

    async fn execute(&self, query: &str, stamp: &str) -> Result<PipelineResult> {
        self.layout.ensure()?;

        let state = self.run_stages(query, stamp).await;

        let report = state
            .report
            .filter(Report::has_answer)
            .ok_or_else(|| Error::Pipeline("No report generated".into()))?;

        self.publish_started(Stage::Export, query);
        let started = Instant::now();
        let exported = self.export_report(&report, state.visualization_path.as_deref(), stamp);
        self.publish_completed(Stage::Export, started, exported.as_ref().err().map(|e| e.to_string()));
        let path = exported?;

        self.event_bus.publish(DomainEvent::ReportExported {
            path: path.display().to_string(),
            timestamp: Utc::now(),
        });

        Ok(PipelineResult::success(
            &report,
            path,
            state.visualization_path.is_some(),
        ))
    }

    async fn research_node(&self, state: &PipelineState) -> StatePatch {
        let records = self.research.run(&state.query).await;
        if records.is_empty() {
            warn!(query = %state.query, "No research results returned");
            return StatePatch::default()
                .with_research_results(records)
                .with_error(Some("No research data found".into()));
        }

        info!(records = records.len(), "Research completed");
        StatePatch::default()
            .with_research_results(records)
            .with_error(None)
    }

    fn visualize_node(&self, state: &PipelineState, path: &Path) -> StatePatch {
        if state.research_results.is_empty() {
            return StatePatch::default()
                .with_visualization(None)
                .with_error(Some("Visualization failed: No research data for visualization".into()));
        }

        match self.visualize.plot_reliability(&state.research_results, path) {
            Some(chart) => StatePatch::default()
                .with_visualization(Some(chart))
                .with_error(None),
            None => StatePatch::default()
                .with_visualization(None)
                .with_error(Some("Visualization failed: chart could not be rendered".into())),
        }
    }

    async fn draft_node(&self, state: &PipelineState) -> StatePatch {
        let report = self
            .draft
            .generate_report(&state.query, &state.research_results)
            .await;
        let error = report.degradation().map(|e| format!("Drafting failed: {e}"));
        StatePatch::default().with_report(report).with_error(error)
    }

    /// Write the document, falling back to plain markdown when the Word
    /// backend fails.
    fn export_report(&self, report: &Report, chart: Option<&Path>, stamp: &str) -> Result<PathBuf> {
        let docx = self.layout.report(stamp);
        let path = match self
            .export
            .to_word(&report.answer, chart, Some(&report.sources), &docx)
        {
            Some(path) => path,
            None => {
                let markdown = self.layout.markdown(stamp);
                warn!(path = %markdown.display(), "Word export failed, saving markdown instead");
                std::fs::write(&markdown, &report.answer).map_err(|e| {
                    Error::Pipeline(format!(
                        "Could not save report to {} or {}: {e}",
                        docx.display(),
                        markdown.display()
                    ))
                })?;
                markdown
            }
        };

        if self.json_sidecar {
            self.export.save_json(report, &self.layout.json(stamp));
            if !report.sources.is_empty() {
                self.export.save_csv(&report.sources, &self.layout.sources_csv(stamp));
            }
        }

        Ok(path)
    }

    fn fail(&self, query: &str, err: &Error, stamp: &str) -> PipelineResult {
        error!(query = %query, error = %err, "Pipeline failed");

        let artifact = self.layout.error_report(stamp);
        if let Err(e) = std::fs::write(&artifact, error_report_text(query, &err.to_string())) {
            error!(path = %artifact.display(), error = %e, "Could not write error report");
        }

        self.event_bus.publish(DomainEvent::PipelineFailed {
            query: query.to_string(),
            error: err.to_string(),
            artifact: artifact.display().to_string(),
            timestamp: Utc::now(),
        });

        PipelineResult::failure(artifact)
    }

    fn publish_started(&self, stage: Stage, query: &str) {
        info!(stage = %stage, "Stage started");
        self.event_bus.publish(DomainEvent::StageStarted {
            stage: stage.to_string(),
            query: query.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn publish_completed(&self, stage: Stage, started: Instant, error: Option<String>) {
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &error {
            Some(e) => warn!(stage = %stage, duration_ms, error = %e, "Stage completed with error"),
            None => info!(stage = %stage, duration_ms, "Stage completed"),
        }
        self.event_bus.publish(DomainEvent::StageCompleted {
            stage: stage.to_string(),
            duration_ms,
            error,
            timestamp: Utc::now(),
        });
    }
}
