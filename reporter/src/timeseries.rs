//! Per-replica-count timeseries artifacts: pod CPU/memory samples and
//! application process-state counters.
//!
//! Both files are optional instrumentation. A missing file yields `Ok(None)`
//! so the caller skips the dependent report; it is never an error.

use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Per-pod CPU/memory samples for one replica count.
pub const POD_METRICS_FILE_NAME: &str = "pod_metrics_timeseries.csv";
/// Application process-state counters for one replica count.
pub const APP_METRICS_FILE_NAME: &str = "app_metrics.csv";

const SERVER_POD_MARKER: &str = "colonies-server";
const DATABASE_POD_MARKER: &str = "postgres";

/// Tier a pod belongs to, derived from its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodClass {
    Server,
    Database,
    Other,
}

/// Classify a pod identifier by marker substring. `Other` pods carry no
/// signal for the reports and are dropped by the reader.
pub fn classify_pod(pod: &str) -> PodClass {
    if pod.contains(SERVER_POD_MARKER) {
        PodClass::Server
    } else if pod.contains(DATABASE_POD_MARKER) {
        PodClass::Database
    } else {
        PodClass::Other
    }
}

/// One resource sample, with the timestamp already rebased to seconds since
/// the first sample of its group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PodSample {
    pub t: i64,
    pub cpu_millicores: f64,
    pub memory_mib: f64,
}

/// Pod resource timeseries for one experiment + replica-count pair.
///
/// The server and database groups each get their own zero point: the series
/// are comparable on relative axes within their own panel, not forced onto a
/// shared absolute clock. Group start timestamps are kept so that data
/// timestamped on the absolute clock (log lines) can be mapped in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodTimeseries {
    pub server: BTreeMap<String, Vec<PodSample>>,
    pub server_start: i64,
    pub database: Vec<PodSample>,
    pub database_start: i64,
}

impl PodTimeseries {
    /// Total server CPU per relative second, summed across server pods.
    pub fn server_cpu_by_second(&self) -> BTreeMap<i64, f64> {
        let mut totals = BTreeMap::new();
        for samples in self.server.values() {
            for sample in samples {
                *totals.entry(sample.t).or_insert(0.0) += sample.cpu_millicores;
            }
        }
        totals
    }

    /// Last relative second observed in either group.
    pub fn max_time(&self) -> i64 {
        let server = self
            .server
            .values()
            .flatten()
            .map(|sample| sample.t)
            .max()
            .unwrap_or(0);
        let database = self
            .database
            .iter()
            .map(|sample| sample.t)
            .max()
            .unwrap_or(0);
        server.max(database)
    }
}

#[derive(Debug, Deserialize)]
struct PodMetricsRow {
    pod: String,
    timestamp: i64,
    cpu_millicores: f64,
    memory_mib: f64,
}

/// Read the pod resource timeseries for one replica count.
///
/// Returns `Ok(None)` when the file is absent or contains no broker-server
/// samples. Rows that fail to parse are dropped.
pub fn read_pod_timeseries(replica_dir: &Path) -> anyhow::Result<Option<PodTimeseries>> {
    let path = replica_dir.join(POD_METRICS_FILE_NAME);
    if !path.exists() {
        log::info!("No pod metrics in {}", replica_dir.display());
        return Ok(None);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open pod metrics {}", path.display()))?;

    let mut server: BTreeMap<String, Vec<PodMetricsRow>> = BTreeMap::new();
    let mut database: Vec<PodMetricsRow> = Vec::new();
    for row in reader.deserialize() {
        let row: PodMetricsRow = match row {
            Ok(row) => row,
            Err(e) => {
                log::debug!("Skipping pod metrics row in {}: {e}", path.display());
                continue;
            }
        };
        match classify_pod(&row.pod) {
            PodClass::Server => server.entry(row.pod.clone()).or_default().push(row),
            PodClass::Database => database.push(row),
            PodClass::Other => {}
        }
    }

    if server.is_empty() {
        log::info!("No broker server samples in {}", path.display());
        return Ok(None);
    }

    let server_start = server
        .values()
        .flatten()
        .map(|row| row.timestamp)
        .min()
        .unwrap_or(0);
    let database_start = database.iter().map(|row| row.timestamp).min().unwrap_or(0);

    Ok(Some(PodTimeseries {
        server: server
            .into_iter()
            .map(|(pod, rows)| (pod, rebase(rows, server_start)))
            .collect(),
        server_start,
        database: rebase(database, database_start),
        database_start,
    }))
}

fn rebase(rows: Vec<PodMetricsRow>, start: i64) -> Vec<PodSample> {
    rows.into_iter()
        .map(|row| PodSample {
            t: row.timestamp - start,
            cpu_millicores: row.cpu_millicores,
            memory_mib: row.memory_mib,
        })
        .collect()
}

/// One application process-state sample, rebased to seconds since the first
/// sample of the series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppMetricsPoint {
    pub t: i64,
    pub waiting: u64,
    pub running: u64,
    pub successful: u64,
    pub failed: u64,
}

#[derive(Debug, Deserialize)]
struct AppMetricsRow {
    timestamp: i64,
    processes_waiting: u64,
    processes_running: u64,
    processes_successful: u64,
    processes_failed: u64,
}

/// Read the application process-state counters for one replica count.
///
/// The series is trusted to be time-ordered by its producer and is not
/// re-sorted; timestamps are rebased to the series' own minimum. Returns
/// `Ok(None)` when the file is absent or empty.
pub fn read_app_metrics(replica_dir: &Path) -> anyhow::Result<Option<Vec<AppMetricsPoint>>> {
    let path = replica_dir.join(APP_METRICS_FILE_NAME);
    if !path.exists() {
        log::info!("No app metrics in {}", replica_dir.display());
        return Ok(None);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open app metrics {}", path.display()))?;

    let mut rows: Vec<AppMetricsRow> = Vec::new();
    for row in reader.deserialize() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) => log::debug!("Skipping app metrics row in {}: {e}", path.display()),
        }
    }

    if rows.is_empty() {
        log::info!("No app metrics data in {}", path.display());
        return Ok(None);
    }

    let start = rows.iter().map(|row| row.timestamp).min().unwrap_or(0);
    Ok(Some(
        rows.into_iter()
            .map(|row| AppMetricsPoint {
                t: row.timestamp - start,
                waiting: row.processes_waiting,
                running: row.processes_running,
                successful: row.processes_successful,
                failed: row.processes_failed,
            })
            .collect(),
    ))
}
