//! Word (`.docx`) backend built on `docx-rs`.

use std::io::Cursor;
use std::path::Path;

use docx_rs::{AlignmentType, BreakType, Docx, Paragraph, Pic, Run, Style, StyleType};
use researchflow_core::error::RenderError;
use researchflow_core::render::{Block, DocumentWriter, ReportDocument, TextRun};
use tracing::debug;

const EMU_PER_INCH: f64 = 914_400.0;

/// Writes [`ReportDocument`]s as Word files.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxWriter;

impl DocxWriter {
    pub fn new() -> Self {
        Self
    }

    fn styled(docx: Docx) -> Docx {
        docx.add_style(
            Style::new("Title", StyleType::Paragraph)
                .name("Title")
                .size(48)
                .bold(),
        )
        .add_style(
            Style::new("Heading1", StyleType::Paragraph)
                .name("Heading 1")
                .size(32)
                .bold(),
        )
        .add_style(
            Style::new("Heading2", StyleType::Paragraph)
                .name("Heading 2")
                .size(28)
                .bold(),
        )
        .add_style(
            Style::new("Heading3", StyleType::Paragraph)
                .name("Heading 3")
                .size(24)
                .bold(),
        )
    }

    fn paragraph(block: &Block) -> Result<Paragraph, RenderError> {
        let paragraph = match block {
            Block::Title(text) => Paragraph::new()
                .add_run(Run::new().add_text(text))
                .style("Title")
                .align(AlignmentType::Center),
            Block::Heading { level, text } => Paragraph::new()
                .add_run(Run::new().add_text(text))
                .style(&format!("Heading{}", (*level).clamp(1, 3))),
            Block::Paragraph(runs) => runs
                .iter()
                .fold(Paragraph::new(), |p, run| p.add_run(Self::run(run))),
            Block::Image { path, width_inches } => Paragraph::new()
                .add_run(Run::new().add_image(Self::picture(path, *width_inches)?))
                .align(AlignmentType::Center),
            Block::Reference { index, title, url } => Paragraph::new()
                .add_run(Run::new().add_text(format!("[{index}] ")).bold())
                .add_run(Run::new().add_text(format!("{title}: {url}"))),
            Block::PageBreak => Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
        };
        Ok(paragraph)
    }

    fn run(run: &TextRun) -> Run {
        let r = Run::new().add_text(&run.text);
        if run.bold { r.bold() } else { r }
    }

    /// Load an image, re-encode it as PNG and scale it to the given width.
    fn picture(path: &Path, width_inches: f64) -> Result<Pic, RenderError> {
        let image_err = |reason: String| RenderError::Image {
            path: path.display().to_string(),
            reason,
        };

        let bytes = std::fs::read(path).map_err(|e| image_err(e.to_string()))?;
        let image = image::load_from_memory(&bytes).map_err(|e| image_err(e.to_string()))?;
        let (width_px, height_px) = (image.width(), image.height());
        if width_px == 0 || height_px == 0 {
            return Err(image_err("image has no pixels".into()));
        }

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .map_err(|e| image_err(e.to_string()))?;

        let width_emu = (width_inches.max(0.1) * EMU_PER_INCH) as u32;
        let height_emu = (f64::from(width_emu) * f64::from(height_px) / f64::from(width_px)) as u32;

        Ok(Pic::new_with_dimensions(png, width_px, height_px).size(width_emu, height_emu))
    }
}

impl DocumentWriter for DocxWriter {
    fn write(&self, document: &ReportDocument, path: &Path) -> Result<(), RenderError> {
        if document.blocks.is_empty() {
            return Err(RenderError::EmptyInput("document has no content".into()));
        }

        let mut docx = Self::styled(Docx::new());
        for block in &document.blocks {
            docx = docx.add_paragraph(Self::paragraph(block)?);
        }

        let io_err = |reason: String| RenderError::Io {
            path: path.display().to_string(),
            reason,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(e.to_string()))?;
        }
        let file = std::fs::File::create(path).map_err(|e| io_err(e.to_string()))?;
        docx.build()
            .pack(file)
            .map_err(|e| RenderError::Document(e.to_string()))?;

        debug!(path = %path.display(), blocks = document.blocks.len(), "Document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample() -> ReportDocument {
        let mut doc = ReportDocument::new();
        doc.push(Block::Title("AI Research Report".into()));
        doc.push(Block::Paragraph(vec![
            TextRun::bold("Generated on: "),
            TextRun::plain("2026-01-01 10:00:00"),
        ]));
        doc.push(Block::Heading {
            level: 1,
            text: "Research Findings".into(),
        });
        doc.push(Block::Paragraph(vec![TextRun::plain("Body text.")]));
        doc.push(Block::PageBreak);
        doc.push(Block::Reference {
            index: 1,
            title: "Example".into(),
            url: "https://example.com".into(),
        });
        doc
    }

    fn write_png(path: &Path) {
        let img = image::RgbImage::from_pixel(40, 20, image::Rgb([46, 204, 113]));
        img.save(path).unwrap();
    }

    #[test]
    fn writes_zip_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.docx");

        DocxWriter::new().write(&sample(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn embeds_image() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("chart.png");
        write_png(&image);

        let mut doc = sample();
        doc.push(Block::Image {
            path: image,
            width_inches: 6.0,
        });
        let path = dir.path().join("with_image.docx");
        DocxWriter::new().write(&doc, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = sample();
        doc.push(Block::Image {
            path: PathBuf::from("/nonexistent/chart.png"),
            width_inches: 6.0,
        });

        let err = DocxWriter::new()
            .write(&doc, &dir.path().join("r.docx"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Image { .. }));
    }

    #[test]
    fn corrupt_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("broken.png");
        std::fs::write(&image, b"not an image").unwrap();

        let mut doc = ReportDocument::new();
        doc.push(Block::Image {
            path: image,
            width_inches: 6.0,
        });
        let err = DocxWriter::new()
            .write(&doc, &dir.path().join("r.docx"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Image { .. }));
    }

    #[test]
    fn empty_document_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocxWriter::new()
            .write(&ReportDocument::new(), &dir.path().join("r.docx"))
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptyInput(_)));
    }
}
