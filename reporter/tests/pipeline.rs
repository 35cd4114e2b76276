//! End-to-end pipeline tests over a synthetic results tree.

use anyhow::Context;
use colonies_report_model::{list_experiments, read_experiment, Experiment};
use colonies_reporter::analyze::speedup;
use colonies_reporter::correlate::{read_log_density, LOG_FILE_NAME};
use colonies_reporter::style::ReportStyle;
use colonies_reporter::timeseries::{
    read_app_metrics, read_pod_timeseries, APP_METRICS_FILE_NAME, POD_METRICS_FILE_NAME,
};
use colonies_reporter::{generate_comparison_report, generate_experiment_reports};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// 2025-03-01T00:00:00Z, matching the timestamps in the synthetic log lines.
const RUN_START: i64 = 1_740_787_200;

fn write_summary(experiment: &Path, replicas: u32, content: &str) -> anyhow::Result<()> {
    let dir = experiment.join(format!("replicas_{replicas}"));
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join("results_summary.csv"), content)?;
    Ok(())
}

/// Two experiments: one fully instrumented (resource metrics, app metrics,
/// experiment-level logs), one latency-only.
fn build_results_tree(root: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    let full = root.join("scaling_20250301_141502");
    write_summary(
        &full,
        1,
        "avg_latency_ms,120.0\n\
         p50_latency_ms,100.0\n\
         p95_latency_ms,180.0\n\
         p99_latency_ms,220.0\n\
         min_latency_ms,80.0\n\
         max_latency_ms,260.0\n\
         avg_cpu_millicores,250.0\n\
         max_cpu_millicores,400.0\n\
         db_avg_cpu_millicores,120.0\n\
         db_max_cpu_millicores,200.0\n\
         executors,4\n\
         processes,1000\n",
    )?;
    write_summary(
        &full,
        3,
        "avg_latency_ms,40.0\n\
         p50_latency_ms,35.0\n\
         p95_latency_ms,70.0\n\
         p99_latency_ms,90.0\n\
         min_latency_ms,25.0\n\
         max_latency_ms,110.0\n\
         avg_cpu_millicores,220.0\n\
         max_cpu_millicores,380.0\n\
         db_avg_cpu_millicores,150.0\n\
         db_max_cpu_millicores,240.0\n\
         executors,4\n\
         processes,1000\n",
    )?;

    let replicas_1 = full.join("replicas_1");
    std::fs::write(
        replicas_1.join(POD_METRICS_FILE_NAME),
        format!(
            "pod,timestamp,cpu_millicores,memory_mib\n\
             colonies-server-0,{t0},250.0,128.0\n\
             colonies-server-1,{t0},230.0,126.0\n\
             colonies-server-0,{t1},260.0,128.0\n\
             colonies-server-1,{t1},240.0,126.0\n\
             colonies-server-0,{t2},255.0,128.0\n\
             postgres-0,{t0},120.0,256.0\n\
             postgres-0,{t2},140.0,256.0\n\
             sidecar-proxy,{t0},5.0,16.0\n",
            t0 = RUN_START,
            t1 = RUN_START + 1,
            t2 = RUN_START + 2,
        ),
    )?;
    std::fs::write(
        replicas_1.join(APP_METRICS_FILE_NAME),
        format!(
            "timestamp,processes_waiting,processes_running,processes_successful,processes_failed\n\
             {t0},100,10,0,0\n\
             {t1},80,20,10,0\n\
             {t2},50,25,35,0\n",
            t0 = RUN_START,
            t1 = RUN_START + 1,
            t2 = RUN_START + 2,
        ),
    )?;
    // Logs at the experiment level exercise the fallback lookup. The event
    // at second 5 is outside the CPU window and must be dropped.
    std::fs::write(
        full.join(LOG_FILE_NAME),
        "2025-03-01T00:00:00Z level=info msg=\"process assigned\"\n\
         2025-03-01T00:00:01Z level=info msg=\"process assigned\"\n\
         2025-03-01T00:00:01Z level=info msg=\"process closed\"\n\
         2025-03-01T00:00:05Z level=info msg=\"teardown\"\n\
         not a log line\n",
    )?;

    let latency_only = root.join("scaling_20250302_090000");
    write_summary(
        &latency_only,
        1,
        "avg_latency_ms,150.0\np95_latency_ms,210.0\nexecutors,8\nprocesses,2000\n",
    )?;
    write_summary(
        &latency_only,
        2,
        "avg_latency_ms,90.0\np95_latency_ms,130.0\nexecutors,8\nprocesses,2000\n",
    )?;

    Ok((full, latency_only))
}

#[test]
fn aggregation_keeps_sequences_aligned() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let (full, latency_only) = build_results_tree(root.path())?;

    let experiment = read_experiment(&full)?;
    assert_eq!(experiment.replicas, vec![1, 3]);
    assert_eq!(experiment.name, "2025-03-01 14:15");
    assert_eq!(experiment.executors, 4);
    assert_eq!(experiment.processes, 1000);
    for len in [
        experiment.avg_latency.len(),
        experiment.p50_latency.len(),
        experiment.p95_latency.len(),
        experiment.p99_latency.len(),
        experiment.min_latency.len(),
        experiment.max_latency.len(),
        experiment.avg_cpu.len(),
        experiment.max_cpu.len(),
        experiment.db_avg_cpu.len(),
        experiment.db_max_cpu.len(),
    ] {
        assert_eq!(len, experiment.replicas.len());
    }
    assert!(experiment.has_resource_metrics());
    assert!(experiment.has_database_metrics());

    let other = read_experiment(&latency_only)?;
    assert!(!other.has_resource_metrics());
    assert!(!other.has_database_metrics());

    let ratios = speedup(&experiment);
    assert_eq!(ratios[0], 1.0);
    assert_eq!(ratios[1], 3.0);
    Ok(())
}

#[test]
fn discovery_finds_both_experiments() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    build_results_tree(root.path())?;
    std::fs::create_dir(root.path().join("not_an_experiment"))?;

    let discovered = list_experiments(root.path())?;
    assert_eq!(discovered.len(), 2);
    Ok(())
}

#[test]
fn optional_instrumentation_loads_and_correlates() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let (full, latency_only) = build_results_tree(root.path())?;
    let replicas_1 = full.join("replicas_1");

    let timeseries = read_pod_timeseries(&replicas_1)?.context("pod metrics should load")?;
    assert_eq!(timeseries.server.len(), 2);
    assert_eq!(timeseries.server_start, RUN_START);
    assert_eq!(timeseries.database.len(), 2);

    let cpu_by_second = timeseries.server_cpu_by_second();
    assert_eq!(cpu_by_second[&0], 480.0);
    assert_eq!(cpu_by_second[&1], 500.0);
    assert_eq!(cpu_by_second[&2], 255.0);

    let density = read_log_density(
        &full,
        &replicas_1,
        &cpu_by_second,
        timeseries.server_start,
    )?
    .context("logs should be found via the experiment-level fallback")?;
    assert_eq!(density.counts, BTreeMap::from([(0, 1), (1, 2)]));

    let app = read_app_metrics(&replicas_1)?.context("app metrics should load")?;
    assert_eq!(app.len(), 3);
    assert_eq!(app[0].t, 0);
    assert_eq!(app[2].t, 2);

    // The latency-only experiment has none of this instrumentation.
    let bare = latency_only.join("replicas_1");
    assert!(read_pod_timeseries(&bare)?.is_none());
    assert!(read_app_metrics(&bare)?.is_none());
    Ok(())
}

#[test]
fn rereading_unchanged_inputs_is_byte_stable() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let (full, _) = build_results_tree(root.path())?;

    let first = read_experiment(&full)?;
    let second = read_experiment(&full)?;
    pretty_assertions::assert_eq!(first, second);
    pretty_assertions::assert_eq!(speedup(&first), speedup(&second));
    Ok(())
}

#[test]
fn comparison_needs_more_than_one_experiment() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let (full, _) = build_results_tree(root.path())?;
    let experiment = read_experiment(&full)?;

    let style = ReportStyle::publication();
    let out = tempfile::tempdir()?;
    let written =
        generate_comparison_report(std::slice::from_ref(&experiment), out.path(), &style)?;
    assert!(written.is_none());
    assert_eq!(WalkDir::new(out.path()).into_iter().count(), 1);
    Ok(())
}

// Rendering needs a system font for label layout, which headless containers
// may not have. Run with `cargo test -- --ignored` on a machine with fonts.
#[test]
#[ignore = "requires system fonts for chart text layout"]
fn full_report_catalogue_is_written() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let (full, latency_only) = build_results_tree(root.path())?;
    let experiments: Vec<Experiment> = vec![read_experiment(&full)?, read_experiment(&latency_only)?];

    let style = ReportStyle::publication();
    let out = tempfile::tempdir()?;

    // One subdirectory per experiment, the way the default output layout
    // (each experiment's own directory) keeps artifact names collision-free.
    let mut written = Vec::new();
    for (index, experiment) in experiments.iter().enumerate() {
        let experiment_out = out.path().join(format!("experiment_{index}"));
        std::fs::create_dir_all(&experiment_out)?;
        written.extend(generate_experiment_reports(experiment, &experiment_out, &style)?);
    }
    written.extend(
        generate_comparison_report(&experiments, out.path(), &style)?
            .context("two experiments must produce a comparison")?,
    );

    let names = WalkDir::new(out.path())
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();

    for expected in [
        "scaling_results_publication.svg",
        "scaling_results_publication.png",
        "cpu_timeseries_r1_publication.svg",
        "cpu_logs_r1_publication.svg",
        "app_metrics_r1_publication.svg",
        "experiments_comparison_publication.svg",
        "experiments_comparison_publication.png",
    ] {
        assert!(
            names.iter().any(|name| name == expected),
            "missing artifact {expected} in {names:?}"
        );
    }
    assert_eq!(written.len(), names.len());
    Ok(())
}
