//! Export stage: the final document plus the JSON and CSV sidecars.
//!
//! The document is assembled as a [`ReportDocument`] first, so its
//! structure is testable without opening a Word file:
//!
//! ```text
//! Title
//! Generated on: <timestamp>
//! # Research Findings
//!   <content: markdown headings become headings, other lines paragraphs>
//! # Source Reliability Analysis   (with an image)
//!   <image>
//! # References                    (with sources)
//!   [1] title: url
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use researchflow_core::render::{Block, DocumentWriter, ReportDocument, TextRun};
use researchflow_core::research::Source;
use serde::Serialize;
use tracing::{error, info};

pub const FINDINGS_HEADING: &str = "Research Findings";
pub const CHART_HEADING: &str = "Source Reliability Analysis";
pub const REFERENCES_HEADING: &str = "References";

/// Deepest heading level taken from markdown markers.
const MAX_HEADING_LEVEL: u8 = 3;

/// Writes the final report through a [`DocumentWriter`].
pub struct ExportAgent {
    writer: Arc<dyn DocumentWriter>,
    title: String,
    image_width_inches: f64,
}

impl ExportAgent {
    pub fn new(writer: Arc<dyn DocumentWriter>, title: impl Into<String>, image_width_inches: f64) -> Self {
        Self {
            writer,
            title: title.into(),
            image_width_inches,
        }
    }

    /// The backend documents are written with.
    pub fn writer(&self) -> &dyn DocumentWriter {
        self.writer.as_ref()
    }

    /// Assemble the report document.
    pub fn build_document(
        &self,
        content: &str,
        image: Option<&Path>,
        sources: Option<&[Source]>,
        generated_at: DateTime<Local>,
    ) -> ReportDocument {
        let mut doc = ReportDocument::new();
        doc.push(Block::Title(self.title.clone()));
        doc.push(Block::Paragraph(vec![
            TextRun::bold("Generated on: "),
            TextRun::plain(generated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]));

        doc.push(heading(1, FINDINGS_HEADING));
        for block in content.lines().filter_map(content_block) {
            doc.push(block);
        }

        if let Some(image) = image {
            doc.push(heading(1, CHART_HEADING));
            doc.push(Block::Image {
                path: image.to_path_buf(),
                width_inches: self.image_width_inches,
            });
        }

        if let Some(sources) = sources.filter(|s| !s.is_empty()) {
            doc.push(heading(1, REFERENCES_HEADING));
            for (i, source) in sources.iter().enumerate() {
                doc.push(Block::Reference {
                    index: i + 1,
                    title: source.title.clone(),
                    url: source.url.clone(),
                });
            }
        }

        doc
    }

    /// Write the report to `path`. `None` (logged) on any failure.
    pub fn to_word(
        &self,
        content: &str,
        image: Option<&Path>,
        sources: Option<&[Source]>,
        path: &Path,
    ) -> Option<PathBuf> {
        let doc = self.build_document(content, image, sources, Local::now());
        match self.writer.write(&doc, path) {
            Ok(()) => {
                info!(path = %path.display(), "Report saved");
                Some(path.to_path_buf())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Error saving report");
                None
            }
        }
    }

    /// Write `value` as pretty-printed JSON. `None` (logged) on failure.
    pub fn save_json<T: Serialize + ?Sized>(&self, value: &T, path: &Path) -> Option<PathBuf> {
        let written = serde_json::to_string_pretty(value)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => {
                info!(path = %path.display(), "JSON saved");
                Some(path.to_path_buf())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Error saving JSON");
                None
            }
        }
    }

    /// Write `rows` as CSV: a header row from the field names, then one
    /// row per item. `None` (logged) when `rows` is empty or writing fails.
    pub fn save_csv<T: Serialize>(&self, rows: &[T], path: &Path) -> Option<PathBuf> {
        if rows.is_empty() {
            error!(path = %path.display(), "Error saving CSV: no rows");
            return None;
        }
        match write_csv(rows, path) {
            Ok(()) => {
                info!(path = %path.display(), rows = rows.len(), "CSV saved");
                Some(path.to_path_buf())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Error saving CSV");
                None
            }
        }
    }
}

fn write_csv<T: Serialize>(rows: &[T], path: &Path) -> csv::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn heading(level: u8, text: &str) -> Block {
    Block::Heading {
        level,
        text: text.to_string(),
    }
}

/// One content line as a block; blank lines (and bare markers) yield nothing.
fn content_block(line: &str) -> Option<Block> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let markers = trimmed.chars().take_while(|c| *c == '#').count();
    if markers == 0 {
        return Some(Block::Paragraph(vec![TextRun::plain(trimmed)]));
    }

    let text = trimmed[markers..].trim();
    if text.is_empty() {
        return None;
    }
    let level = u8::try_from(markers).unwrap_or(u8::MAX).min(MAX_HEADING_LEVEL);
    Some(heading(level, text))
}
