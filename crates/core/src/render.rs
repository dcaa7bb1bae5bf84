//! Render ports: chart and document backends.
//!
//! The visualization and export stages build backend-neutral models
//! ([`ReliabilityChart`], [`ReportDocument`]) and hand them to a
//! [`ChartRenderer`] or [`DocumentWriter`]. Backends only translate the
//! model into bytes on disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Reliability bucket of a source score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReliabilityTier {
    /// score > 0.8
    High,
    /// 0.6 < score <= 0.8
    Medium,
    /// score <= 0.6
    Low,
}

impl ReliabilityTier {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            Self::High
        } else if score > 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Bar colour as RGB.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::High => (0x2e, 0xcc, 0x71),
            Self::Medium => (0xf3, 0x9c, 0x12),
            Self::Low => (0xe7, 0x4c, 0x3c),
        }
    }

    /// Bar colour as `#rrggbb`.
    pub fn hex(self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

/// One bar of the reliability chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    /// Axis label (already shortened)
    pub label: String,
    pub score: f64,
    pub tier: ReliabilityTier,
}

/// A horizontal bar chart of source scores, x-axis fixed to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ReliabilityChart {
    pub title: String,
    pub x_label: String,
    pub bars: Vec<ChartBar>,
}

/// Writes a chart image to disk.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &ReliabilityChart, path: &Path) -> Result<(), RenderError>;
}

/// A run of text inside a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// A structural element of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Centered document title
    Title(String),
    /// Section heading, level 1..=3
    Heading { level: u8, text: String },
    Paragraph(Vec<TextRun>),
    /// Embedded image at a fixed width
    Image { path: PathBuf, width_inches: f64 },
    /// One `[index] title: url` entry of a reference list
    Reference {
        index: usize,
        title: String,
        url: String,
    },
    PageBreak,
}

/// A backend-neutral document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDocument {
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Reference entries in document order.
    pub fn references(&self) -> Vec<(usize, &str, &str)> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Reference { index, title, url } => Some((*index, title.as_str(), url.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Whether a heading with exactly this text exists.
    pub fn has_heading(&self, text: &str) -> bool {
        self.blocks
            .iter()
            .any(|b| matches!(b, Block::Heading { text: t, .. } if t == text))
    }
}

/// Writes a document to disk.
pub trait DocumentWriter: Send + Sync {
    fn write(&self, document: &ReportDocument, path: &Path) -> Result<(), RenderError>;
}
