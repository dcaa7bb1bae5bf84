//! Error types for the ResearchFlow domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator boundary has its own error enum; [`Error`] wraps them
//! for anything that crosses into the pipeline.

use thiserror::Error;

/// The top-level error type for all ResearchFlow operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Search provider / generation model ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Chart and document backends ---
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// A stage was handed input it cannot work with (e.g. no research records).
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The pipeline could not reach a terminal success state.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Boundary errors ---

/// Failures talking to a remote provider (search API or generation model).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures producing a chart image or a document file.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("Nothing to render: {0}")]
    EmptyInput(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Document rendering failed: {0}")]
    Document(String),

    #[error("Unreadable image {path}: {reason}")]
    Image { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Io { path: String, reason: String },
}
