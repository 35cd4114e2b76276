//! Chart rendering, one module per artifact in the report catalogue.

use crate::style::ReportStyle;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

pub mod app_metrics;
pub mod comparison;
pub mod cpu_logs;
pub mod cpu_timeseries;
pub mod latency;

pub(crate) type Area<DB> = DrawingArea<DB, Shift>;

/// Render one artifact in every output format the style asks for. All
/// encodings share the style's file stem for the given base name.
macro_rules! render_artifact {
    ($out_dir:expr, $base:expr, $size:expr, $style:expr, |$root:ident| $draw:expr) => {{
        let mut written: Vec<std::path::PathBuf> = Vec::new();
        for format in &$style.output_formats {
            let path = $out_dir.join(format!(
                "{}.{}",
                $style.file_stem($base),
                format.extension()
            ));
            match format {
                $crate::style::OutputFormat::Png => {
                    let $root =
                        plotters::prelude::BitMapBackend::new(&path, $size).into_drawing_area();
                    $draw;
                    $root.present()?;
                }
                $crate::style::OutputFormat::Svg => {
                    let $root =
                        plotters::prelude::SVGBackend::new(&path, $size).into_drawing_area();
                    $draw;
                    $root.present()?;
                }
            }
            log::info!("Saved {}", path.display());
            written.push(path);
        }
        written
    }};
}
pub(crate) use render_artifact;

/// Pixel budget for an axis label area, scaled with the label font.
pub(crate) fn label_area(style: &ReportStyle) -> u32 {
    style.label_font_size * 3
}

/// Pad an axis upper bound so the largest value does not touch the frame.
pub(crate) fn pad_range(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.15
    } else {
        1.0
    }
}

/// Solid series line with circular markers and a line-sample legend entry.
pub(crate) fn line_with_markers<DB: DrawingBackend>(
    ctx: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    points: &[(f64, f64)],
    color: RGBColor,
    label: &str,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    let stroke = style.stroke_width;
    ctx.draw_series(LineSeries::new(
        points.iter().copied(),
        color.stroke_width(stroke),
    ))?
    .label(label)
    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(stroke)));
    ctx.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), style.marker_size, color.filled())),
    )?;
    Ok(())
}

/// Thinner dashed companion line, used for max/percentile overlays.
pub(crate) fn dashed_line<DB: DrawingBackend>(
    ctx: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    points: Vec<(f64, f64)>,
    color: RGBColor,
    label: &str,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    let stroke = style.stroke_width.saturating_sub(1).max(1);
    ctx.draw_series(DashedLineSeries::new(
        points.into_iter(),
        6,
        4,
        color.stroke_width(stroke),
    ))?
    .label(label)
    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(stroke)));
    Ok(())
}

/// Centered placeholder for a panel whose backing data is absent.
pub(crate) fn draw_placeholder<DB: DrawingBackend>(
    area: &Area<DB>,
    style: &ReportStyle,
    message: &str,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    let (width, height) = area.dim_in_pixel();
    let text_style = TextStyle::from((style.font_family, style.label_font_size).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(
        message.to_string(),
        ((width / 2) as i32, (height / 2) as i32),
        text_style,
    ))?;
    Ok(())
}
