//! The four pipeline stages.
//!
//! Each agent wraps one external collaborator behind its port trait and
//! contains that collaborator's failures: searches that fail count as
//! empty, drafting failures become a degraded report, rendering failures
//! become `None`. Only [`DraftAgent::draft`] reports a hard precondition
//! error, and [`DraftAgent::generate_report`] absorbs it.

pub mod draft;
pub mod export;
pub mod research;
pub mod visualize;

#[cfg(test)]
mod test_helpers;

pub use draft::DraftAgent;
pub use export::ExportAgent;
pub use research::{ResearchAgent, corrected_query};
pub use visualize::{VisualizationAgent, chart_label};
