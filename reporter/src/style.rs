//! Styling profiles for report rendering.
//!
//! There is no process-wide style registry: the generator receives an
//! explicit [`ReportStyle`] value and every chart module reads it from there.

use plotters::style::RGBColor;

/// Artifact encoding written by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raster output via the bitmap backend.
    Png,
    /// Vector output via the SVG backend.
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

/// Styling configuration threaded through the report generator.
#[derive(Debug, Clone)]
pub struct ReportStyle {
    pub font_family: &'static str,
    /// Annotate every data point with its numeric value.
    pub annotate_points: bool,
    /// Draw a descriptive headline above the panels.
    pub headline_titles: bool,
    /// Encodings written per artifact, sharing one base name.
    pub output_formats: Vec<OutputFormat>,
    pub title_font_size: u32,
    pub label_font_size: u32,
    pub legend_font_size: u32,
    pub stroke_width: u32,
    pub marker_size: u32,
    file_suffix: &'static str,
}

impl ReportStyle {
    /// Diagnostic profile: large markers, per-point value annotations and a
    /// descriptive headline on every chart.
    pub fn interactive() -> Self {
        Self {
            font_family: "sans-serif",
            annotate_points: true,
            headline_titles: true,
            output_formats: vec![OutputFormat::Png],
            title_font_size: 20,
            label_font_size: 15,
            legend_font_size: 13,
            stroke_width: 3,
            marker_size: 5,
            file_suffix: "",
        }
    }

    /// Publication profile: serif typography, no annotations, and both a
    /// vector and a raster encoding per artifact.
    pub fn publication() -> Self {
        Self {
            font_family: "serif",
            annotate_points: false,
            headline_titles: false,
            output_formats: vec![OutputFormat::Svg, OutputFormat::Png],
            title_font_size: 16,
            label_font_size: 12,
            legend_font_size: 10,
            stroke_width: 2,
            marker_size: 3,
            file_suffix: "_publication",
        }
    }

    /// File stem for an artifact base name under this profile.
    pub fn file_stem(&self, base: &str) -> String {
        format!("{base}{}", self.file_suffix)
    }
}

// Colorblind-friendly palette used for the fixed chart roles.
pub const PRIMARY: RGBColor = RGBColor(0x00, 0x72, 0xB2);
pub const SECONDARY: RGBColor = RGBColor(0xD5, 0x5E, 0x00);
pub const TERTIARY: RGBColor = RGBColor(0x00, 0x9E, 0x73);
pub const QUATERNARY: RGBColor = RGBColor(0xCC, 0x79, 0xA7);
pub const GRAY: RGBColor = RGBColor(0x66, 0x66, 0x66);

/// Cycling palette for panels with one series per pod or per experiment.
pub const SERIES_PALETTE: [RGBColor; 10] = [
    RGBColor(0x1F, 0x77, 0xB4),
    RGBColor(0xFF, 0x7F, 0x0E),
    RGBColor(0x2C, 0xA0, 0x2C),
    RGBColor(0xD6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xBD),
    RGBColor(0x8C, 0x56, 0x4B),
    RGBColor(0xE3, 0x77, 0xC2),
    RGBColor(0x7F, 0x7F, 0x7F),
    RGBColor(0xBC, 0xBD, 0x22),
    RGBColor(0x17, 0xBE, 0xCF),
];

pub fn series_color(index: usize) -> RGBColor {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}
