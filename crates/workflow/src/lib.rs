//! Research pipeline: research → visualize → draft → export.
//!
//! The stages run strictly in sequence over one [`PipelineState`]. Each
//! stage returns a [`StatePatch`] that the [`PipelineOrchestrator`] merges
//! before the next stage starts. A run always ends in a [`PipelineResult`]:
//! either the exported report or a written error artifact.

pub mod orchestrator;
pub mod output;
pub mod state;

pub use orchestrator::PipelineOrchestrator;
pub use output::{OutputLayout, PipelineResult, error_report_text};
pub use state::{PipelineState, Stage, StatePatch};
