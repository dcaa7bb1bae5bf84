//! Configuration loading, validation, and management for ResearchFlow.
//!
//! Loads configuration from `~/.researchflow/config.toml` (or an explicit
//! path) with environment variable overrides. Validates all settings at
//! startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the search-provider key.
pub const SEARCH_API_KEY_VAR: &str = "TAVILY_API_KEY";

/// Environment variable holding the generation-model key.
pub const GENERATION_API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where documents, charts and error reports are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where `research.log` goes (defaults to `output_dir`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub document: DocumentConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./research_outputs")
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// Text-generation model settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Display name of the backend
    #[serde(default = "default_generation_provider")]
    pub provider_name: String,

    /// OpenAI-compatible base URL
    #[serde(default = "default_generation_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_generation_provider() -> String {
    "gemini".into()
}
fn default_generation_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".into()
}
fn default_model() -> String {
    "gemini-1.5-pro-latest".into()
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider_name: default_generation_provider(),
            api_url: default_generation_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider_name", &self.provider_name)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Web-search provider settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_search_url")]
    pub api_url: String,
}

fn default_search_url() -> String {
    "https://api.tavily.com".into()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_search_url(),
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Reliability chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_title")]
    pub title: String,

    #[serde(default = "default_x_label")]
    pub x_label: String,

    #[serde(default = "default_chart_width")]
    pub width: u32,

    #[serde(default = "default_chart_height")]
    pub height: u32,

    /// TrueType font for chart text; common system fonts are tried when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

fn default_chart_title() -> String {
    "Source Reliability".into()
}
fn default_x_label() -> String {
    "Reliability Score".into()
}
fn default_chart_width() -> u32 {
    1200
}
fn default_chart_height() -> u32 {
    600
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: default_chart_title(),
            x_label: default_x_label(),
            width: default_chart_width(),
            height: default_chart_height(),
            font_path: None,
        }
    }
}

/// Output document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_document_title")]
    pub title: String,

    #[serde(default = "default_image_width")]
    pub image_width_inches: f64,

    /// Also write the report as `report_<ts>.json`
    #[serde(default)]
    pub json_sidecar: bool,
}

fn default_document_title() -> String {
    "AI Research Report".into()
}
fn default_image_width() -> f64 {
    6.0
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: default_document_title(),
            image_width_inches: default_image_width(),
            json_sidecar: false,
        }
    }
}

/// Both keys the pipeline needs to start.
#[derive(Clone)]
pub struct Credentials {
    pub search_api_key: String,
    pub generation_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("search_api_key", &"[REDACTED]")
            .field("generation_api_key", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.researchflow/config.toml)
    /// and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from `path` and apply environment overrides.
    ///
    /// Recognised variables:
    /// - `TAVILY_API_KEY`, `GOOGLE_API_KEY` (credentials)
    /// - `RESEARCHFLOW_MODEL`
    /// - `RESEARCHFLOW_OUTPUT_DIR`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup (highest priority).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(SEARCH_API_KEY_VAR) {
            self.search.api_key = Some(key);
        }
        if let Some(key) = non_empty(GENERATION_API_KEY_VAR) {
            self.generation.api_key = Some(key);
        }
        if let Some(model) = non_empty("RESEARCHFLOW_MODEL") {
            self.generation.model = model;
        }
        if let Some(dir) = non_empty("RESEARCHFLOW_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
    }

    /// Both credentials, or the first missing variable.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let search_api_key = self.search.api_key.clone().ok_or(ConfigError::MissingCredential {
            variable: SEARCH_API_KEY_VAR,
        })?;
        let generation_api_key =
            self.generation
                .api_key
                .clone()
                .ok_or(ConfigError::MissingCredential {
                    variable: GENERATION_API_KEY_VAR,
                })?;
        Ok(Credentials {
            search_api_key,
            generation_api_key,
        })
    }

    /// Directory `research.log` is written to.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| self.output_dir.clone())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".researchflow")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(ConfigError::ValidationError(
                "chart.width and chart.height must be > 0".into(),
            ));
        }

        if self.document.image_width_inches <= 0.0 {
            return Err(ConfigError::ValidationError(
                "document.image_width_inches must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            log_dir: None,
            generation: GenerationConfig::default(),
            search: SearchConfig::default(),
            chart: ChartConfig::default(),
            document: DocumentConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("{variable} environment variable is required")]
    MissingCredential { variable: &'static str },
}
