//! Report generation for Colonies scaling benchmark results.
//!
//! Drives the experiment model, the timeseries readers and the derived
//! metrics to produce a fixed catalogue of chart artifacts: a latency report
//! per experiment, CPU/process-state/CPU+log reports per replica count, and
//! one comparison report when more than one experiment is in the set.
//! Optional instrumentation only gates its own artifacts; a missing file
//! skips a report, it never fails the run.

use crate::style::ReportStyle;
use colonies_report_model::Experiment;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod analyze;
pub mod chart;
pub mod correlate;
pub mod style;
pub mod timeseries;

/// Fatal input conditions; everything less than these degrades in place.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No experiments found under {}", .root.display())]
    NoExperiments { root: PathBuf },
    #[error("No usable experiment data in the requested set")]
    NoUsableData,
}

/// Generate the full artifact catalogue for one experiment.
///
/// Always writes the latency report; per replica count, each timeseries
/// artifact is written only when its backing file exists. Returns the paths
/// of everything written.
pub fn generate_experiment_reports(
    experiment: &Experiment,
    out_dir: &Path,
    style: &ReportStyle,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = chart::latency::render(experiment, out_dir, style)?;

    for &replicas in &experiment.replicas {
        let replica_dir = experiment.replica_dir(replicas);

        if let Some(timeseries) = timeseries::read_pod_timeseries(&replica_dir)? {
            written.extend(chart::cpu_timeseries::render(
                &timeseries,
                replicas,
                out_dir,
                style,
            )?);

            let cpu_by_second = timeseries.server_cpu_by_second();
            let density = correlate::read_log_density(
                &experiment.path,
                &replica_dir,
                &cpu_by_second,
                timeseries.server_start,
            )?;
            written.extend(chart::cpu_logs::render(
                &cpu_by_second,
                density.as_ref(),
                replicas,
                out_dir,
                style,
            )?);
        }

        if let Some(points) = timeseries::read_app_metrics(&replica_dir)? {
            written.extend(chart::app_metrics::render(
                &points,
                replicas,
                out_dir,
                style,
            )?);
        }
    }

    Ok(written)
}

/// Generate the cross-experiment comparison report.
///
/// Returns `Ok(None)` without writing anything when the set has fewer than
/// two experiments.
pub fn generate_comparison_report(
    experiments: &[Experiment],
    out_dir: &Path,
    style: &ReportStyle,
) -> anyhow::Result<Option<Vec<PathBuf>>> {
    if experiments.len() < 2 {
        log::info!(
            "Skipping comparison report, only {} usable experiment(s)",
            experiments.len()
        );
        return Ok(None);
    }
    Ok(Some(chart::comparison::render(experiments, out_dir, style)?))
}
