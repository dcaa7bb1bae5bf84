//! # ResearchFlow Core
//!
//! Domain types, port traits, and error definitions for the ResearchFlow
//! research pipeline. This crate has **no I/O dependencies**: it defines the
//! model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here. Implementations live in
//! their own crates:
//! - [`Provider`] (text generation) and [`SearchClient`] (web search) in
//!   `researchflow-providers`
//! - [`ChartRenderer`] and [`DocumentWriter`] in `researchflow-render`
//!
//! Stages take these as `Arc<dyn _>` so tests swap in scripted doubles.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod render;
pub mod research;
pub mod search;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, RenderError, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use render::{
    Block, ChartBar, ChartRenderer, DocumentWriter, ReliabilityChart, ReliabilityTier,
    ReportDocument, TextRun,
};
pub use research::{Report, ResearchRecord, Source};
pub use search::{SearchClient, SearchDepth, SearchHit, SearchRequest, SearchResponse};
