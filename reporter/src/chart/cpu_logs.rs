//! Per-replica-count CPU report with the aligned log-event density on a
//! secondary axis. Without log data the CPU panel renders alone.

use crate::chart::{self, render_artifact, Area};
use crate::correlate::LogDensity;
use crate::style::{self, ReportStyle};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub fn base_name(replicas: u32) -> String {
    format!("cpu_logs_r{replicas}")
}

pub fn render(
    cpu_by_second: &BTreeMap<i64, f64>,
    density: Option<&LogDensity>,
    replicas: u32,
    out_dir: &Path,
    style: &ReportStyle,
) -> anyhow::Result<Vec<PathBuf>> {
    let base = base_name(replicas);
    Ok(render_artifact!(out_dir, &base, (1200, 520), style, |root| {
        draw(&root, cpu_by_second, density, replicas, style)?
    }))
}

fn draw<DB: DrawingBackend>(
    root: &Area<DB>,
    cpu_by_second: &BTreeMap<i64, f64>,
    density: Option<&LogDensity>,
    replicas: u32,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let root = if style.headline_titles {
        let headline = format!("CPU Utilization with Log Events - {replicas} Replicas");
        root.titled(
            &headline,
            (style.font_family, style.title_font_size).into_font(),
        )?
    } else {
        root.clone()
    };

    let points = cpu_by_second
        .iter()
        .map(|(&second, &cpu)| (second as f64, cpu))
        .collect::<Vec<_>>();
    let x_max = cpu_by_second.keys().last().copied().unwrap_or(0).max(1) as f64;
    let y_max = chart::pad_range(points.iter().map(|&(_, cpu)| cpu).fold(0.0, f64::max));

    let density = density.filter(|density| !density.is_empty());
    if let Some(density) = density {
        let y2_max = chart::pad_range(density.max_count() as f64);

        let mut ctx = ChartBuilder::on(&root)
            .margin(10)
            .x_label_area_size(chart::label_area(style))
            .y_label_area_size(chart::label_area(style) + 12)
            .right_y_label_area_size(chart::label_area(style) + 12)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)?
            .set_secondary_coord(0f64..x_max, 0f64..y2_max);

        ctx.configure_mesh()
            .x_desc("Time (seconds)")
            .y_desc("CPU (millicores)")
            .label_style((style.font_family, style.label_font_size).into_font())
            .axis_desc_style(
                TextStyle::from((style.font_family, style.label_font_size).into_font())
                    .color(&style::PRIMARY),
            )
            .draw()?;
        ctx.configure_secondary_axes()
            .y_desc("Log Events per Second")
            .label_style((style.font_family, style.label_font_size).into_font())
            .draw()?;

        ctx.draw_series(AreaSeries::new(
            points.iter().copied(),
            0.0,
            style::PRIMARY.mix(0.2),
        ))?;
        ctx.draw_series(LineSeries::new(
            points.iter().copied(),
            style::PRIMARY.stroke_width(style.stroke_width),
        ))?
        .label("Total CPU")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 16, y)], style::PRIMARY.stroke_width(2))
        });

        ctx.draw_secondary_series(density.counts.iter().map(|(&second, &count)| {
            Rectangle::new(
                [
                    (second as f64 - 0.4, 0.0),
                    (second as f64 + 0.4, count as f64),
                ],
                style::SECONDARY.mix(0.3).filled(),
            )
        }))?
        .label("Log Events/sec")
        .legend(|(x, y)| {
            Rectangle::new([(x, y - 4), (x + 10, y + 4)], style::SECONDARY.mix(0.3).filled())
        });

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.5))
            .label_font((style.font_family, style.legend_font_size).into_font())
            .draw()?;
    } else {
        let mut ctx = ChartBuilder::on(&root)
            .margin(10)
            .x_label_area_size(chart::label_area(style))
            .y_label_area_size(chart::label_area(style) + 12)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

        ctx.configure_mesh()
            .x_desc("Time (seconds)")
            .y_desc("CPU (millicores)")
            .label_style((style.font_family, style.label_font_size).into_font())
            .axis_desc_style(
                TextStyle::from((style.font_family, style.label_font_size).into_font())
                    .color(&style::PRIMARY),
            )
            .draw()?;

        ctx.draw_series(AreaSeries::new(
            points.iter().copied(),
            0.0,
            style::PRIMARY.mix(0.2),
        ))?;
        ctx.draw_series(LineSeries::new(
            points.iter().copied(),
            style::PRIMARY.stroke_width(style.stroke_width),
        ))?
        .label("Total CPU")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 16, y)], style::PRIMARY.stroke_width(2))
        });

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.5))
            .label_font((style.font_family, style.legend_font_size).into_font())
            .draw()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_base_names_carry_the_replica_count() {
        assert_eq!(base_name(1), "cpu_logs_r1");
    }
}
