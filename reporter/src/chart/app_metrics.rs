//! Per-replica-count process-state report: stacked waiting/running/successful
//! bands over the run's relative time axis.

use crate::chart::{self, render_artifact, Area};
use crate::style::{self, ReportStyle};
use crate::timeseries::AppMetricsPoint;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

pub fn base_name(replicas: u32) -> String {
    format!("app_metrics_r{replicas}")
}

pub fn render(
    points: &[AppMetricsPoint],
    replicas: u32,
    out_dir: &Path,
    style: &ReportStyle,
) -> anyhow::Result<Vec<PathBuf>> {
    let base = base_name(replicas);
    Ok(render_artifact!(out_dir, &base, (1200, 620), style, |root| {
        draw(&root, points, replicas, style)?
    }))
}

fn draw<DB: DrawingBackend>(
    root: &Area<DB>,
    points: &[AppMetricsPoint],
    replicas: u32,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let root = if style.headline_titles {
        let headline = format!("Process States Over Time - {replicas} Replicas");
        root.titled(
            &headline,
            (style.font_family, style.title_font_size).into_font(),
        )?
    } else {
        root.clone()
    };

    // Cumulative band boundaries, bottom-up: waiting, +running, +successful.
    let waiting = cumulative(points, |point| point.waiting);
    let running = cumulative(points, |point| point.waiting + point.running);
    let successful = cumulative(points, |point| {
        point.waiting + point.running + point.successful
    });

    let x_max = points.last().map(|point| point.t).unwrap_or(0).max(1) as f64;
    let y_max = chart::pad_range(successful.iter().map(|&(_, y)| y).fold(0.0, f64::max));

    let mut ctx = ChartBuilder::on(&root)
        .caption(
            "Process States Over Time",
            (style.font_family, style.title_font_size).into_font(),
        )
        .margin(10)
        .x_label_area_size(chart::label_area(style))
        .y_label_area_size(chart::label_area(style) + 12)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    ctx.configure_mesh()
        .x_desc("Time (seconds)")
        .y_desc("Process Count")
        .label_style((style.font_family, style.label_font_size).into_font())
        .axis_desc_style((style.font_family, style.label_font_size).into_font())
        .draw()?;

    // Tallest band first so the lower ones paint over it.
    ctx.draw_series(AreaSeries::new(
        successful.iter().copied(),
        0.0,
        style::TERTIARY.mix(0.5),
    ))?;
    ctx.draw_series(AreaSeries::new(
        running.iter().copied(),
        0.0,
        style::SECONDARY.mix(0.5),
    ))?;
    ctx.draw_series(AreaSeries::new(
        waiting.iter().copied(),
        0.0,
        style::PRIMARY.mix(0.5),
    ))?;

    for (points, color, label) in [
        (&waiting, style::PRIMARY, "Waiting"),
        (&running, style::SECONDARY, "Running"),
        (&successful, style::TERTIARY, "Successful"),
    ] {
        let stroke = style.stroke_width.saturating_sub(1).max(1);
        ctx.draw_series(LineSeries::new(
            points.iter().copied(),
            color.stroke_width(stroke),
        ))?
        .label(label)
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 4), (x + 10, y + 4)], color.mix(0.5).filled())
        });
    }

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.5))
        .label_font((style.font_family, style.legend_font_size).into_font())
        .draw()?;
    Ok(())
}

fn cumulative<F>(points: &[AppMetricsPoint], level: F) -> Vec<(f64, f64)>
where
    F: Fn(&AppMetricsPoint) -> u64,
{
    points
        .iter()
        .map(|point| (point.t as f64, level(point) as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_stack_cumulatively() {
        let points = [
            AppMetricsPoint {
                t: 0,
                waiting: 10,
                running: 5,
                successful: 1,
                failed: 0,
            },
            AppMetricsPoint {
                t: 5,
                waiting: 4,
                running: 8,
                successful: 9,
                failed: 1,
            },
        ];

        let top = cumulative(&points, |p| p.waiting + p.running + p.successful);
        assert_eq!(top, vec![(0.0, 16.0), (5.0, 21.0)]);
    }

    #[test]
    fn artifact_base_names_carry_the_replica_count() {
        assert_eq!(base_name(7), "app_metrics_r7");
    }
}
