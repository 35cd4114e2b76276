//! Per-replica-count CPU-over-time report: one line per broker server pod,
//! with the database tier in its own panel on the same relative time axis.

use crate::chart::{self, render_artifact, Area};
use crate::style::{self, ReportStyle};
use crate::timeseries::{PodSample, PodTimeseries};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

pub fn base_name(replicas: u32) -> String {
    format!("cpu_timeseries_r{replicas}")
}

pub fn render(
    timeseries: &PodTimeseries,
    replicas: u32,
    out_dir: &Path,
    style: &ReportStyle,
) -> anyhow::Result<Vec<PathBuf>> {
    let base = base_name(replicas);
    Ok(render_artifact!(out_dir, &base, (1200, 800), style, |root| {
        draw(&root, timeseries, replicas, style)?
    }))
}

fn draw<DB: DrawingBackend>(
    root: &Area<DB>,
    timeseries: &PodTimeseries,
    replicas: u32,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let root = if style.headline_titles {
        let headline = format!("CPU Load Over Time - {replicas} Replicas");
        root.titled(
            &headline,
            (style.font_family, style.title_font_size).into_font(),
        )?
    } else {
        root.clone()
    };

    // Both panels share the experiment-relative x span.
    let x_max = (timeseries.max_time().max(1)) as f64;
    let panels = root.split_evenly((2, 1));
    draw_server_panel(&panels[0], timeseries, x_max, style)?;
    if timeseries.database.is_empty() {
        chart::draw_placeholder(&panels[1], style, "No database metrics available")?;
    } else {
        draw_database_panel(&panels[1], &timeseries.database, x_max, style)?;
    }
    Ok(())
}

fn draw_server_panel<DB: DrawingBackend>(
    area: &Area<DB>,
    timeseries: &PodTimeseries,
    x_max: f64,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    let y_max = chart::pad_range(
        timeseries
            .server
            .values()
            .flatten()
            .map(|sample| sample.cpu_millicores)
            .fold(0.0, f64::max),
    );

    let mut ctx = ChartBuilder::on(area)
        .caption(
            "(a) Colonies Server Replicas CPU",
            (style.font_family, style.title_font_size).into_font(),
        )
        .margin(10)
        .x_label_area_size(chart::label_area(style))
        .y_label_area_size(chart::label_area(style) + 12)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    ctx.configure_mesh()
        .y_desc("CPU (millicores)")
        .label_style((style.font_family, style.label_font_size).into_font())
        .axis_desc_style((style.font_family, style.label_font_size).into_font())
        .draw()?;

    let stroke = style.stroke_width.saturating_sub(1).max(1);
    for (index, (pod, samples)) in timeseries.server.iter().enumerate() {
        let color = style::series_color(index);
        ctx.draw_series(LineSeries::new(
            cpu_points(samples),
            color.stroke_width(stroke),
        ))?
        .label(pod_label(pod))
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(stroke))
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

fn draw_database_panel<DB: DrawingBackend>(
    area: &Area<DB>,
    samples: &[PodSample],
    x_max: f64,
    style: &ReportStyle,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    let y_max = chart::pad_range(
        samples
            .iter()
            .map(|sample| sample.cpu_millicores)
            .fold(0.0, f64::max),
    );

    let mut ctx = ChartBuilder::on(area)
        .caption(
            "(b) PostgreSQL CPU",
            (style.font_family, style.title_font_size).into_font(),
        )
        .margin(10)
        .x_label_area_size(chart::label_area(style))
        .y_label_area_size(chart::label_area(style) + 12)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    ctx.configure_mesh()
        .x_desc("Time (seconds)")
        .y_desc("CPU (millicores)")
        .label_style((style.font_family, style.label_font_size).into_font())
        .axis_desc_style((style.font_family, style.label_font_size).into_font())
        .draw()?;

    let stroke = style.stroke_width.saturating_sub(1).max(1);
    ctx.draw_series(AreaSeries::new(
        cpu_points(samples),
        0.0,
        style::QUATERNARY.mix(0.2),
    ))?;
    ctx.draw_series(LineSeries::new(
        cpu_points(samples),
        style::QUATERNARY.stroke_width(stroke),
    ))?
    .label("PostgreSQL")
    .legend(move |(x, y)| {
        PathElement::new(
            vec![(x, y), (x + 16, y)],
            style::QUATERNARY.stroke_width(stroke),
        )
    });

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.5))
        .label_font((style.font_family, style.legend_font_size).into_font())
        .draw()?;
    Ok(())
}

fn cpu_points(samples: &[PodSample]) -> impl Iterator<Item = (f64, f64)> + '_ {
    samples
        .iter()
        .map(|sample| (sample.t as f64, sample.cpu_millicores))
}

/// Label a server pod by its ordinal suffix, e.g. `colonies-server-2` is
/// shown as `Replica 2`. Pods without one keep their full identifier.
fn pod_label(pod: &str) -> String {
    pod.rsplit('-')
        .next()
        .and_then(|suffix| suffix.parse::<u32>().ok())
        .map(|ordinal| format!("Replica {ordinal}"))
        .unwrap_or_else(|| pod.to_string())
}
