//! Per-experiment latency report: percentile bars, latency-vs-replica trend
//! and, when the experiment recorded them, server and database CPU panels.

use crate::chart::{self, dashed_line, line_with_markers, render_artifact, Area};
use crate::style::{self, ReportStyle};
use colonies_report_model::{Experiment, MetricSeries};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};

pub const BASE_NAME: &str = "scaling_results";

const BAR_WIDTH: f64 = 0.2;

pub fn render(
    experiment: &Experiment,
    out_dir: &Path,
    style: &ReportStyle,
) -> anyhow::Result<Vec<PathBuf>> {
    if experiment.is_empty() {
        log::warn!("Not rendering latency report for empty {}", experiment.name);
        return Ok(Vec::new());
    }
    let size = if experiment.has_resource_metrics() {
        (1400, 1200)
    } else {
        (1400, 620)
    };
    Ok(render_artifact!(out_dir, BASE_NAME, size, style, |root| {
        draw(&root, experiment, style)?
    }))
}

fn draw<DB: DrawingBackend>(
    root: &Area<DB>,
    experiment: &Experiment,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let root = if style.headline_titles {
        let headline = format!(
            "Colonies Assign Performance - {} ({} executors, {} processes)",
            experiment.name, experiment.executors, experiment.processes
        );
        root.titled(
            &headline,
            (style.font_family, style.title_font_size).into_font(),
        )?
    } else {
        root.clone()
    };

    if experiment.has_resource_metrics() {
        let panels = root.split_evenly((2, 2));
        draw_percentile_bars(&panels[0], experiment, style)?;
        draw_latency_trend(&panels[1], experiment, style)?;
        draw_cpu_panel(
            &panels[2],
            experiment,
            &experiment.avg_cpu,
            &experiment.max_cpu,
            "(c) Server CPU per Replica",
            "Avg CPU per replica",
            style::SECONDARY,
            style,
        )?;
        if experiment.has_database_metrics() {
            draw_cpu_panel(
                &panels[3],
                experiment,
                &experiment.db_avg_cpu,
                &experiment.db_max_cpu,
                "(d) Database CPU",
                "Avg PostgreSQL CPU",
                style::QUATERNARY,
                style,
            )?;
        } else {
            chart::draw_placeholder(&panels[3], style, "No database metrics available")?;
        }
    } else {
        let panels = root.split_evenly((1, 2));
        draw_percentile_bars(&panels[0], experiment, style)?;
        draw_latency_trend(&panels[1], experiment, style)?;
    }
    Ok(())
}

/// Grouped bar chart of the latency percentiles, one group per replica count.
fn draw_percentile_bars<DB: DrawingBackend>(
    area: &Area<DB>,
    experiment: &Experiment,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    let groups: [(&str, &MetricSeries, RGBColor); 4] = [
        ("Mean", &experiment.avg_latency, style::TERTIARY),
        ("P50", &experiment.p50_latency, style::PRIMARY),
        ("P95", &experiment.p95_latency, style::SECONDARY),
        ("P99", &experiment.p99_latency, style::QUATERNARY),
    ];
    let count = experiment.replicas.len();
    let y_max = chart::pad_range(
        groups
            .iter()
            .map(|(_, series, _)| series.max_value())
            .fold(0.0, f64::max),
    );

    let mut ctx = ChartBuilder::on(area)
        .caption(
            "(a) Latency Percentiles",
            (style.font_family, style.title_font_size).into_font(),
        )
        .margin(10)
        .x_label_area_size(chart::label_area(style))
        .y_label_area_size(chart::label_area(style) + 12)
        .build_cartesian_2d(-0.5f64..count as f64 - 0.5, 0f64..y_max)?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(count)
        .x_label_formatter(&|x| replica_tick(&experiment.replicas, *x))
        .x_desc("Number of Replicas")
        .y_desc("Latency (ms)")
        .label_style((style.font_family, style.label_font_size).into_font())
        .axis_desc_style((style.font_family, style.label_font_size).into_font())
        .draw()?;

    for (bar_index, (label, series, color)) in groups.iter().enumerate() {
        let color = *color;
        let offset = (bar_index as f64 - 1.5) * BAR_WIDTH;
        ctx.draw_series(series.values().iter().enumerate().map(|(index, &value)| {
            let center = index as f64 + offset;
            Rectangle::new(
                [
                    (center - BAR_WIDTH / 2.0, 0.0),
                    (center + BAR_WIDTH / 2.0, value),
                ],
                color.filled(),
            )
        }))?
        .label(*label)
        .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 10, y + 4)], color.filled()));

        if style.annotate_points {
            let annotation = TextStyle::from(
                (style.font_family, style.legend_font_size.saturating_sub(2)).into_font(),
            )
            .pos(Pos::new(HPos::Center, VPos::Bottom));
            for (index, &value) in series.values().iter().enumerate() {
                ctx.plotting_area().draw(&Text::new(
                    format!("{value:.0}"),
                    (index as f64 + offset, value + y_max * 0.005),
                    annotation.clone(),
                ))?;
            }
        }
    }

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.5))
        .label_font((style.font_family, style.legend_font_size).into_font())
        .draw()?;
    Ok(())
}

/// Latency percentile trend lines over the replica counts, with a min-max
/// band behind them.
fn draw_latency_trend<DB: DrawingBackend>(
    area: &Area<DB>,
    experiment: &Experiment,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    let xs = replica_axis(&experiment.replicas);
    let (x_min, x_max) = axis_span(&xs);
    let y_max = chart::pad_range(
        [
            &experiment.avg_latency,
            &experiment.p95_latency,
            &experiment.p99_latency,
            &experiment.max_latency,
        ]
        .iter()
        .map(|series| series.max_value())
        .fold(0.0, f64::max),
    );

    let mut ctx = ChartBuilder::on(area)
        .caption(
            "(b) Latency vs. Replica Count",
            (style.font_family, style.title_font_size).into_font(),
        )
        .margin(10)
        .x_label_area_size(chart::label_area(style))
        .y_label_area_size(chart::label_area(style) + 12)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    ctx.configure_mesh()
        .x_labels(experiment.replicas.len().max(2))
        .x_label_formatter(&|x| format!("{x:.0}"))
        .x_desc("Number of Replicas")
        .y_desc("Latency (ms)")
        .label_style((style.font_family, style.label_font_size).into_font())
        .axis_desc_style((style.font_family, style.label_font_size).into_font())
        .draw()?;

    let band = series_points(&xs, &experiment.min_latency)
        .into_iter()
        .chain(series_points(&xs, &experiment.max_latency).into_iter().rev())
        .collect::<Vec<_>>();
    ctx.draw_series(std::iter::once(Polygon::new(
        band,
        style::PRIMARY.mix(0.15),
    )))?
    .label("Min-Max")
    .legend(|(x, y)| {
        Rectangle::new([(x, y - 4), (x + 10, y + 4)], style::PRIMARY.mix(0.15).filled())
    });

    line_with_markers(
        &mut ctx,
        &series_points(&xs, &experiment.avg_latency),
        style::TERTIARY,
        "Mean",
        style,
    )?;
    dashed_line(
        &mut ctx,
        series_points(&xs, &experiment.p95_latency),
        style::SECONDARY,
        "P95",
        style,
    )?;
    dashed_line(
        &mut ctx,
        series_points(&xs, &experiment.p99_latency),
        style::QUATERNARY,
        "P99",
        style,
    )?;

    if style.annotate_points {
        let annotation = TextStyle::from((style.font_family, style.legend_font_size).into_font())
            .pos(Pos::new(HPos::Left, VPos::Center))
            .color(&style::TERTIARY);
        let nudge = (x_max - x_min) * 0.015;
        for (x, y) in series_points(&xs, &experiment.avg_latency) {
            ctx.plotting_area().draw(&Text::new(
                format!("{y:.0}ms"),
                (x + nudge, y),
                annotation.clone(),
            ))?;
        }
    }

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.5))
        .label_font((style.font_family, style.legend_font_size).into_font())
        .draw()?;
    Ok(())
}

/// CPU-vs-replica panel shared by the server and database tiers: a filled
/// area up to the max values, the mean as a marked line and the max dashed.
#[allow(clippy::too_many_arguments)]
fn draw_cpu_panel<DB: DrawingBackend>(
    area: &Area<DB>,
    experiment: &Experiment,
    avg: &MetricSeries,
    max: &MetricSeries,
    caption: &str,
    avg_label: &str,
    color: RGBColor,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    let xs = replica_axis(&experiment.replicas);
    let (x_min, x_max) = axis_span(&xs);
    let y_max = chart::pad_range(avg.max_value().max(max.max_value()));

    let mut ctx = ChartBuilder::on(area)
        .caption(
            caption,
            (style.font_family, style.title_font_size).into_font(),
        )
        .margin(10)
        .x_label_area_size(chart::label_area(style))
        .y_label_area_size(chart::label_area(style) + 12)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    ctx.configure_mesh()
        .x_labels(experiment.replicas.len().max(2))
        .x_label_formatter(&|x| format!("{x:.0}"))
        .x_desc("Number of Replicas")
        .y_desc("CPU (millicores)")
        .label_style((style.font_family, style.label_font_size).into_font())
        .axis_desc_style((style.font_family, style.label_font_size).into_font())
        .draw()?;

    ctx.draw_series(AreaSeries::new(
        series_points(&xs, max),
        0.0,
        color.mix(0.15),
    ))?;
    line_with_markers(&mut ctx, &series_points(&xs, avg), color, avg_label, style)?;
    dashed_line(&mut ctx, series_points(&xs, max), color, "Max CPU", style)?;

    if style.annotate_points {
        let annotation = TextStyle::from((style.font_family, style.legend_font_size).into_font())
            .pos(Pos::new(HPos::Left, VPos::Center))
            .color(&color);
        let nudge = (x_max - x_min) * 0.015;
        for (x, y) in series_points(&xs, avg) {
            ctx.plotting_area().draw(&Text::new(
                format!("{y:.0}m"),
                (x + nudge, y),
                annotation.clone(),
            ))?;
        }
    }

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.5))
        .label_font((style.font_family, style.legend_font_size).into_font())
        .draw()?;
    Ok(())
}

fn replica_axis(replicas: &[u32]) -> Vec<f64> {
    replicas.iter().map(|&count| f64::from(count)).collect()
}

fn axis_span(xs: &[f64]) -> (f64, f64) {
    let min = xs.first().copied().unwrap_or(1.0);
    let max = xs.last().copied().unwrap_or(1.0);
    if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

fn series_points(xs: &[f64], series: &MetricSeries) -> Vec<(f64, f64)> {
    xs.iter()
        .copied()
        .zip(series.values().iter().copied())
        .collect()
}

fn replica_tick(replicas: &[u32], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 0.01 || rounded < 0.0 {
        return String::new();
    }
    replicas
        .get(rounded as usize)
        .map(|count| count.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_ticks_map_group_centers_to_labels() {
        let replicas = vec![1, 3, 10];
        assert_eq!(replica_tick(&replicas, 0.0), "1");
        assert_eq!(replica_tick(&replicas, 2.0), "10");
        assert_eq!(replica_tick(&replicas, 1.5), "");
        assert_eq!(replica_tick(&replicas, -1.0), "");
        assert_eq!(replica_tick(&replicas, 3.0), "");
    }

    #[test]
    fn axis_span_widens_single_points() {
        assert_eq!(axis_span(&[4.0]), (3.5, 4.5));
        assert_eq!(axis_span(&[1.0, 8.0]), (1.0, 8.0));
    }
}
