//! Cross-experiment comparison report: mean/P95/P99 latency per replica
//! count and scaling efficiency against the ideal-linear reference.

use crate::analyze;
use crate::chart::{self, dashed_line, line_with_markers, render_artifact, Area};
use crate::style::{self, ReportStyle};
use colonies_report_model::{Experiment, MetricSeries};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

pub const BASE_NAME: &str = "experiments_comparison";

pub fn render(
    experiments: &[Experiment],
    out_dir: &Path,
    style: &ReportStyle,
) -> anyhow::Result<Vec<PathBuf>> {
    Ok(render_artifact!(
        out_dir,
        BASE_NAME,
        (1400, 1000),
        style,
        |root| draw(&root, experiments, style)?
    ))
}

fn draw<DB: DrawingBackend>(
    root: &Area<DB>,
    experiments: &[Experiment],
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let root = if style.headline_titles {
        let headline = format!(
            "Colonies Assign - Scaling Comparison ({} experiments)",
            experiments.len()
        );
        root.titled(
            &headline,
            (style.font_family, style.title_font_size).into_font(),
        )?
    } else {
        root.clone()
    };

    let panels = root.split_evenly((2, 2));
    draw_latency_panel(
        &panels[0],
        experiments,
        "(a) Mean Latency",
        "Mean Latency (ms)",
        |experiment| &experiment.avg_latency,
        style,
        true,
    )?;
    draw_latency_panel(
        &panels[1],
        experiments,
        "(b) P95 Latency",
        "P95 Latency (ms)",
        |experiment| &experiment.p95_latency,
        style,
        style.headline_titles,
    )?;
    draw_latency_panel(
        &panels[2],
        experiments,
        "(c) P99 Latency",
        "P99 Latency (ms)",
        |experiment| &experiment.p99_latency,
        style,
        style.headline_titles,
    )?;
    draw_speedup_panel(&panels[3], experiments, style)?;
    Ok(())
}

fn draw_latency_panel<DB: DrawingBackend, F>(
    area: &Area<DB>,
    experiments: &[Experiment],
    caption: &str,
    y_desc: &str,
    select: F,
    style: &ReportStyle,
    with_legend: bool,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
    F: Fn(&Experiment) -> &MetricSeries,
{
    let (x_min, x_max) = replica_span(experiments);
    let y_max = chart::pad_range(
        experiments
            .iter()
            .map(|experiment| select(experiment).max_value())
            .fold(0.0, f64::max),
    );

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
        .x_label_formatter(&|x| format!("{x:.0}"))
        .x_desc("Number of Replicas")
        .y_desc(y_desc)
        .label_style((style.font_family, style.label_font_size).into_font())
        .axis_desc_style((style.font_family, style.label_font_size).into_font())
        .draw()?;

    for (index, experiment) in experiments.iter().enumerate() {
        let points = metric_points(experiment, select(experiment));
        line_with_markers(
            &mut ctx,
            &points,
            style::series_color(index),
            &experiment_label(experiment, style),
            style,
        )?;
    }

    if with_legend {
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.5))
            .label_font((style.font_family, style.legend_font_size).into_font())
            .draw()?;
    }
    Ok(())
}

/// Speedup per experiment with the ideal-linear overlay. The overlay spans
/// 1..=max replicas over the whole set and is never fed back into the data.
fn draw_speedup_panel<DB: DrawingBackend>(
    area: &Area<DB>,
    experiments: &[Experiment],
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = replica_span(experiments);
    let max_replicas = experiments
        .iter()
        .filter_map(Experiment::max_replicas)
        .max()
        .unwrap_or(1);

    let speedups = experiments
        .iter()
        .map(|experiment| {
            experiment
                .replicas
                .iter()
                .map(|&count| f64::from(count))
                .zip(analyze::speedup(experiment))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let observed_max = speedups
        .iter()
        .flatten()
        .map(|&(_, ratio)| ratio)
        .fold(0.0, f64::max);
    let y_max = chart::pad_range(observed_max.max(f64::from(max_replicas)));

    let mut ctx = ChartBuilder::on(area)
        .caption(
            "(d) Scaling Efficiency",
            (style.font_family, style.title_font_size).into_font(),
        )
        .margin(10)
        .x_label_area_size(chart::label_area(style))
        .y_label_area_size(chart::label_area(style) + 12)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    ctx.configure_mesh()
        .x_label_formatter(&|x| format!("{x:.0}"))
        .x_desc("Number of Replicas")
        .y_desc("Speedup (vs. 1 replica)")
        .label_style((style.font_family, style.label_font_size).into_font())
        .axis_desc_style((style.font_family, style.label_font_size).into_font())
        .draw()?;

    for (index, (experiment, points)) in experiments.iter().zip(&speedups).enumerate() {
        line_with_markers(
            &mut ctx,
            points,
            style::series_color(index),
            &experiment_label(experiment, style),
            style,
        )?;
    }

    let ideal = analyze::ideal_linear(max_replicas)
        .into_iter()
        .map(|(count, ratio)| (f64::from(count), ratio))
        .collect::<Vec<_>>();
    dashed_line(&mut ctx, ideal, style::GRAY, "Ideal (linear)", style)?;

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.5))
        .label_font((style.font_family, style.legend_font_size).into_font())
        .draw()?;
    Ok(())
}

fn experiment_label(experiment: &Experiment, style: &ReportStyle) -> String {
    if style.headline_titles {
        format!(
            "{} ({}e/{}p)",
            experiment.name, experiment.executors, experiment.processes
        )
    } else {
        format!("{} executors", experiment.executors)
    }
}

fn metric_points(experiment: &Experiment, series: &MetricSeries) -> Vec<(f64, f64)> {
    experiment
        .replicas
        .iter()
        .map(|&count| f64::from(count))
        .zip(series.values().iter().copied())
        .collect()
}

/// Shared x-span over every experiment's own replica-count domain; the
/// domains may differ in length and are never merged.
fn replica_span(experiments: &[Experiment]) -> (f64, f64) {
    let min = experiments
        .iter()
        .filter_map(|experiment| experiment.replicas.first())
        .min()
        .copied()
        .unwrap_or(1);
    let max = experiments
        .iter()
        .filter_map(|experiment| experiment.replicas.last())
        .max()
        .copied()
        .unwrap_or(1);
    if min == max {
        (f64::from(min) - 0.5, f64::from(max) + 0.5)
    } else {
        (f64::from(min), f64::from(max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_span_covers_differing_domains() {
        let a = Experiment {
            replicas: vec![1, 2, 3],
            ..Experiment::default()
        };
        let b = Experiment {
            replicas: vec![2, 4, 8],
            ..Experiment::default()
        };

        assert_eq!(replica_span(&[a, b]), (1.0, 8.0));
    }

    #[test]
    fn replica_span_widens_a_degenerate_domain() {
        let a = Experiment {
            replicas: vec![2],
            ..Experiment::default()
        };
        assert_eq!(replica_span(&[a]), (1.5, 2.5));
    }
}
