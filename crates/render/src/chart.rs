//! PNG bar-chart backend built on `plotters`.
//!
//! Text needs a TrueType font registered with plotters. The renderer looks
//! for one once per process (configured path first, then common system
//! locations). Without a font it still draws the bars and the plot frame,
//! just no caption or labels.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, register_font};
use researchflow_core::error::RenderError;
use researchflow_core::render::{ChartRenderer, ReliabilityChart};
use tracing::{debug, warn};

const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// The font registered with plotters, if any. Plotters keeps one font per
/// family for the whole process, so the first renderer to draw picks it.
static REGISTERED_FONT: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Renders [`ReliabilityChart`]s as PNG images.
pub struct PlottersChartRenderer {
    width: u32,
    height: u32,
    font_path: Option<PathBuf>,
}

impl PlottersChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            font_path: None,
        }
    }

    /// Prefer this TrueType font for chart text.
    ///
    /// The font is process-wide: once any renderer has registered one, a
    /// different font requested here is ignored (with a warning).
    pub fn with_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Whether text can be drawn (registers a font on first call).
    pub fn text_enabled(&self) -> bool {
        let active = REGISTERED_FONT.get_or_init(|| register_first_font(self.font_path.as_deref()));
        if let Some(requested) = ignored_font(self.font_path.as_deref(), active.as_deref()) {
            warn!(
                requested = %requested.display(),
                active = %active.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "none".into()),
                "Chart font already chosen for this process; requested font ignored"
            );
        }
        active.is_some()
    }

    fn draw(&self, chart: &ReliabilityChart, path: &Path, with_text: bool) -> Result<(), RenderError> {
        let n = chart.bars.len();
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20).margin_right(70);
        if with_text {
            let label_width = (self.width / 4).clamp(120, 320);
            builder
                .caption(&chart.title, (FONT_FAMILY, 28))
                .x_label_area_size(50)
                .y_label_area_size(label_width);
        }

        let mut ctx = builder
            .build_cartesian_2d(0f64..1f64, 0f64..n as f64)
            .map_err(chart_err)?;

        if with_text {
            ctx.configure_mesh()
                .disable_y_mesh()
                .disable_y_axis()
                .x_labels(11)
                .x_label_formatter(&|x| format!("{x:.1}"))
                .x_desc(chart.x_label.as_str())
                .label_style((FONT_FAMILY, 14))
                .axis_desc_style((FONT_FAMILY, 16))
                .draw()
                .map_err(chart_err)?;
        } else {
            ctx.plotting_area()
                .draw(&Rectangle::new([(0.0, 0.0), (1.0, n as f64)], BLACK.stroke_width(1)))
                .map_err(chart_err)?;
        }

        ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
            let (r, g, b) = bar.tier.rgb();
            let y = i as f64;
            Rectangle::new([(0.0, y + 0.15), (bar.score, y + 0.85)], RGBColor(r, g, b).filled())
        }))
        .map_err(chart_err)?;

        if with_text {
            let value_style = TextStyle::from((FONT_FAMILY, 14).into_font())
                .pos(Pos::new(HPos::Left, VPos::Center));
            ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
                Text::new(
                    format!("{:.2}", bar.score),
                    (bar.score + 0.02, i as f64 + 0.5),
                    value_style.clone(),
                )
            }))
            .map_err(chart_err)?;

            let label_style = TextStyle::from((FONT_FAMILY, 14).into_font())
                .pos(Pos::new(HPos::Right, VPos::Center));
            for (i, bar) in chart.bars.iter().enumerate() {
                let (x, y) = ctx.backend_coord(&(0.0, i as f64 + 0.5));
                root.draw(&Text::new(bar.label.clone(), (x - 8, y), label_style.clone()))
                    .map_err(chart_err)?;
            }
        }

        root.present().map_err(chart_err)?;
        Ok(())
    }
}

impl Default for PlottersChartRenderer {
    fn default() -> Self {
        Self::new(1200, 600)
    }
}

/// Register the preferred font, else the first usable system font.
fn register_first_font(preferred: Option<&Path>) -> Option<PathBuf> {
    let candidates = preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
    for candidate in candidates {
        let Ok(bytes) = std::fs::read(&candidate) else {
            continue;
        };
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
            debug!(font = %candidate.display(), "Chart font registered");
            return Some(candidate);
        }
    }
    warn!("No TrueType font found; charts will be drawn without text");
    None
}

/// The requested font when it is not the one in use.
fn ignored_font<'a>(requested: Option<&'a Path>, active: Option<&Path>) -> Option<&'a Path> {
    requested.filter(|r| active != Some(*r))
}

impl ChartRenderer for PlottersChartRenderer {
    fn render(&self, chart: &ReliabilityChart, path: &Path) -> Result<(), RenderError> {
        if chart.bars.is_empty() {
            return Err(RenderError::EmptyInput("chart has no bars".into()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RenderError::Io {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let with_text = self.text_enabled();
        self.draw(chart, path, with_text)?;
        debug!(path = %path.display(), bars = chart.bars.len(), with_text, "Chart rendered");
        Ok(())
    }
}

fn chart_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Chart(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use researchflow_core::render::{ChartBar, ReliabilityTier};

    fn chart(scores: &[f64]) -> ReliabilityChart {
        ReliabilityChart {
            title: "Source Reliability".into(),
            x_label: "Reliability Score".into(),
            bars: scores
                .iter()
                .enumerate()
                .map(|(i, s)| ChartBar {
                    label: format!("Source {}", i + 1),
                    score: *s,
                    tier: ReliabilityTier::from_score(*s),
                })
                .collect(),
        }
    }

    #[test]
    fn renders_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts").join("reliability.png");
        let renderer = PlottersChartRenderer::new(800, 400);

        renderer.render(&chart(&[0.9, 0.5, 0.2]), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn renders_single_bar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.png");
        PlottersChartRenderer::default()
            .render(&chart(&[1.0]), &path)
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn font_choice_is_process_wide() {
        let first = PlottersChartRenderer::default().text_enabled();
        let later = PlottersChartRenderer::default().with_font("/nonexistent/late.ttf");
        assert_eq!(later.text_enabled(), first);
    }

    #[test]
    fn only_a_different_requested_font_is_ignored() {
        let dejavu = Path::new("/fonts/DejaVuSans.ttf");
        let arial = Path::new("/fonts/Arial.ttf");
        assert_eq!(ignored_font(None, Some(dejavu)), None);
        assert_eq!(ignored_font(Some(dejavu), Some(dejavu)), None);
        assert_eq!(ignored_font(Some(arial), Some(dejavu)), Some(arial));
        assert_eq!(ignored_font(Some(arial), None), Some(arial));
    }

    #[test]
    fn empty_chart_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        let err = PlottersChartRenderer::default()
            .render(&chart(&[]), &path)
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptyInput(_)));
        assert!(!path.exists());
    }
}
