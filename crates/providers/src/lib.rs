//! Provider implementations for ResearchFlow.
//!
//! Generation backends implement `researchflow_core::Provider`; search
//! backends implement `researchflow_core::SearchClient`. [`build_from_config`]
//! wires both from the application config.

pub mod openai_compat;
pub mod router;
pub mod tavily;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{Providers, build_from_config};
pub use tavily::TavilyClient;
