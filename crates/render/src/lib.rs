//! Rendering backends for ResearchFlow.
//!
//! - [`PlottersChartRenderer`] implements `ChartRenderer` with `plotters`'
//!   bitmap backend and writes PNG files.
//! - [`DocxWriter`] implements `DocumentWriter` with `docx-rs` and writes
//!   Word (`.docx`) files.

pub mod chart;
pub mod docx;

pub use chart::PlottersChartRenderer;
pub use docx::DocxWriter;
