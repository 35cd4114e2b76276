use crate::locate::display_name;
use crate::summary::{read_summary, Summary};
use anyhow::Context;
use itertools::Itertools;
use std::path::{Path, PathBuf};

/// Directory name prefix for per-replica-count result directories.
pub const REPLICA_DIR_PREFIX: &str = "replicas_";
/// File holding the scalar metrics for one replica count.
pub const SUMMARY_FILE_NAME: &str = "results_summary.csv";

/// Summary keys tracked per replica count.
pub mod keys {
    pub const AVG_LATENCY_MS: &str = "avg_latency_ms";
    pub const P50_LATENCY_MS: &str = "p50_latency_ms";
    pub const P95_LATENCY_MS: &str = "p95_latency_ms";
    pub const P99_LATENCY_MS: &str = "p99_latency_ms";
    pub const MIN_LATENCY_MS: &str = "min_latency_ms";
    pub const MAX_LATENCY_MS: &str = "max_latency_ms";
    pub const AVG_CPU_MILLICORES: &str = "avg_cpu_millicores";
    pub const MAX_CPU_MILLICORES: &str = "max_cpu_millicores";
    pub const DB_AVG_CPU_MILLICORES: &str = "db_avg_cpu_millicores";
    pub const DB_MAX_CPU_MILLICORES: &str = "db_max_cpu_millicores";
    pub const EXECUTORS: &str = "executors";
    pub const PROCESSES: &str = "processes";
}

/// One per-replica metric sequence, aligned with [`Experiment::replicas`].
///
/// A key missing from a summary zero-fills the value but records it as not
/// measured, so "zero measured" and "metric absent" stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    values: Vec<f64>,
    measured: Vec<bool>,
}

impl MetricSeries {
    fn push(&mut self, value: Option<f64>) {
        self.values.push(value.unwrap_or(0.0));
        self.measured.push(value.is_some());
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the value at `index` came from the summary file rather than
    /// from zero-filling a missing key.
    pub fn is_measured(&self, index: usize) -> bool {
        self.measured.get(index).copied().unwrap_or(false)
    }

    /// True when at least one replica recorded a value above zero. This is
    /// the signal deciding whether dependent report panels render at all.
    pub fn any_above_zero(&self) -> bool {
        self.values.iter().any(|value| *value > 0.0)
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// All results for one scaling experiment.
///
/// Constructed once by [`read_experiment`] and immutable afterwards. Every
/// metric sequence has exactly one entry per element of `replicas`; a replica
/// count without a summary file is absent from the sequence, not represented
/// by a gap entry, which keeps all sequences aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Experiment {
    pub path: PathBuf,
    pub name: String,
    /// Executor count, taken from the first replica count with data.
    pub executors: u64,
    /// Submitted process count, taken from the first replica count with data.
    pub processes: u64,
    pub replicas: Vec<u32>,
    pub avg_latency: MetricSeries,
    pub p50_latency: MetricSeries,
    pub p95_latency: MetricSeries,
    pub p99_latency: MetricSeries,
    pub min_latency: MetricSeries,
    pub max_latency: MetricSeries,
    pub avg_cpu: MetricSeries,
    pub max_cpu: MetricSeries,
    pub db_avg_cpu: MetricSeries,
    pub db_max_cpu: MetricSeries,
}

impl Experiment {
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    pub fn max_replicas(&self) -> Option<u32> {
        self.replicas.last().copied()
    }

    /// Whether any replica recorded server CPU usage. Gates every resource
    /// panel: a report renders all of them or none.
    pub fn has_resource_metrics(&self) -> bool {
        self.avg_cpu.any_above_zero()
    }

    /// Whether any replica recorded database CPU usage. Gates the database
    /// sub-panel independently of [`Experiment::has_resource_metrics`].
    pub fn has_database_metrics(&self) -> bool {
        self.db_avg_cpu.any_above_zero()
    }

    /// Directory holding the artifacts for one replica count.
    pub fn replica_dir(&self, replicas: u32) -> PathBuf {
        self.path.join(format!("{REPLICA_DIR_PREFIX}{replicas}"))
    }
}

/// Read every replica result from an experiment directory.
///
/// Replica-count subdirectories are discovered from their names rather than
/// probed from a fixed range, so any cardinality the benchmark produced is
/// picked up. A replica count without a summary file is skipped; the caller
/// sees an empty experiment when nothing at all was found and decides whether
/// to warn or skip.
pub fn read_experiment(dir: &Path) -> anyhow::Result<Experiment> {
    let mut experiment = Experiment {
        path: dir.to_path_buf(),
        name: display_name(dir),
        ..Experiment::default()
    };

    for count in replica_counts(dir)? {
        let summary_path = experiment.replica_dir(count).join(SUMMARY_FILE_NAME);
        if !summary_path.exists() {
            log::info!(
                "No summary for {count} replicas in {}",
                experiment.path.display()
            );
            continue;
        }
        let summary = read_summary(&summary_path)?;
        append_replica(&mut experiment, count, &summary);
    }

    Ok(experiment)
}

fn append_replica(experiment: &mut Experiment, count: u32, summary: &Summary) {
    experiment.replicas.push(count);
    experiment.avg_latency.push(summary.number(keys::AVG_LATENCY_MS));
    experiment.p50_latency.push(summary.number(keys::P50_LATENCY_MS));
    experiment.p95_latency.push(summary.number(keys::P95_LATENCY_MS));
    experiment.p99_latency.push(summary.number(keys::P99_LATENCY_MS));
    experiment.min_latency.push(summary.number(keys::MIN_LATENCY_MS));
    experiment.max_latency.push(summary.number(keys::MAX_LATENCY_MS));
    experiment.avg_cpu.push(summary.number(keys::AVG_CPU_MILLICORES));
    experiment.max_cpu.push(summary.number(keys::MAX_CPU_MILLICORES));
    experiment
        .db_avg_cpu
        .push(summary.number(keys::DB_AVG_CPU_MILLICORES));
    experiment
        .db_max_cpu
        .push(summary.number(keys::DB_MAX_CPU_MILLICORES));

    // Topology is assumed constant across replica counts; capture it from the
    // first replica that reports it and never overwrite.
    if experiment.executors == 0 {
        experiment.executors = summary
            .number(keys::EXECUTORS)
            .map(|value| value as u64)
            .unwrap_or(0);
        experiment.processes = summary
            .number(keys::PROCESSES)
            .map(|value| value as u64)
            .unwrap_or(0);
    }
}

/// Replica-count subdirectories of `dir`, in ascending numeric order.
fn replica_counts(dir: &Path) -> anyhow::Result<Vec<u32>> {
    let mut counts = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read experiment directory {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(count) = name
            .to_str()
            .and_then(|name| name.strip_prefix(REPLICA_DIR_PREFIX))
            .and_then(|suffix| suffix.parse::<u32>().ok())
        else {
            continue;
        };
        counts.push(count);
    }
    Ok(counts.into_iter().sorted_unstable().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_replica_summary(
        experiment: &Path,
        count: u32,
        content: &str,
    ) -> anyhow::Result<()> {
        let dir = experiment.join(format!("{REPLICA_DIR_PREFIX}{count}"));
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(SUMMARY_FILE_NAME), content)?;
        Ok(())
    }

    #[test]
    fn sequences_stay_aligned_across_gaps() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("scaling_20250301_141502");
        write_replica_summary(
            &dir,
            1,
            "avg_latency_ms,100.0\np95_latency_ms,150.0\nexecutors,4\nprocesses,1000\n",
        )?;
        write_replica_summary(&dir, 3, "avg_latency_ms,40.0\np95_latency_ms,70.0\n")?;
        // An empty replica directory must not produce a gap entry.
        std::fs::create_dir_all(dir.join(format!("{REPLICA_DIR_PREFIX}2")))?;

        let experiment = read_experiment(&dir)?;

        assert_eq!(experiment.replicas, vec![1, 3]);
        assert_eq!(experiment.avg_latency.values(), &[100.0, 40.0]);
        assert_eq!(experiment.p95_latency.values(), &[150.0, 70.0]);
        for series in [
            &experiment.avg_latency,
            &experiment.p50_latency,
            &experiment.p95_latency,
            &experiment.p99_latency,
            &experiment.min_latency,
            &experiment.max_latency,
            &experiment.avg_cpu,
            &experiment.max_cpu,
            &experiment.db_avg_cpu,
            &experiment.db_max_cpu,
        ] {
            assert_eq!(series.len(), experiment.replicas.len());
        }
        Ok(())
    }

    #[test]
    fn missing_keys_zero_fill_but_stay_unmeasured() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("scaling_20250301_141502");
        write_replica_summary(&dir, 1, "avg_latency_ms,100.0\navg_cpu_millicores,0.0\n")?;

        let experiment = read_experiment(&dir)?;

        assert_eq!(experiment.avg_cpu.values(), &[0.0]);
        assert!(experiment.avg_cpu.is_measured(0));
        assert_eq!(experiment.p50_latency.values(), &[0.0]);
        assert!(!experiment.p50_latency.is_measured(0));
        assert!(!experiment.has_resource_metrics());
        Ok(())
    }

    #[test]
    fn topology_comes_from_first_replica_with_data() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("scaling_20250301_141502");
        write_replica_summary(&dir, 2, "avg_latency_ms,50.0\nexecutors,8\nprocesses,2000\n")?;
        write_replica_summary(&dir, 4, "avg_latency_ms,30.0\nexecutors,16\nprocesses,4000\n")?;

        let experiment = read_experiment(&dir)?;

        assert_eq!(experiment.executors, 8);
        assert_eq!(experiment.processes, 2000);
        Ok(())
    }

    #[test]
    fn empty_experiment_is_reported_as_empty() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("scaling_20250301_141502");
        std::fs::create_dir_all(&dir)?;

        let experiment = read_experiment(&dir)?;
        assert!(experiment.is_empty());
        Ok(())
    }

    #[test]
    fn replica_discovery_is_numeric_not_lexicographic() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("scaling_20250301_141502");
        for count in [10, 2, 1] {
            write_replica_summary(&dir, count, "avg_latency_ms,10.0\n")?;
        }
        std::fs::create_dir_all(dir.join("replicas_x"))?;

        let experiment = read_experiment(&dir)?;
        assert_eq!(experiment.replicas, vec![1, 2, 10]);
        Ok(())
    }

    #[test]
    fn database_presence_is_gated_independently() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("scaling_20250301_141502");
        write_replica_summary(
            &dir,
            1,
            "avg_latency_ms,100.0\navg_cpu_millicores,250.0\ndb_avg_cpu_millicores,0.0\n",
        )?;

        let experiment = read_experiment(&dir)?;
        assert!(experiment.has_resource_metrics());
        assert!(!experiment.has_database_metrics());
        Ok(())
    }
}
