//! Log-density correlation: bucket structured log lines per second and align
//! the counts to a CPU timeseries axis.

use anyhow::Context;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Structured log lines for one replica count (or, as fallback, for the
/// whole experiment).
pub const LOG_FILE_NAME: &str = "colonies_logs.jsonl";

const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const LOG_TIMESTAMP_LEN: usize = 19;
/// Log seconds farther than this from every CPU sample second are dropped,
/// so setup/teardown chatter cannot stretch the reported time axis.
const ALIGNMENT_WINDOW_SECS: i64 = 1;

/// Per-second log event counts aligned to a CPU time axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogDensity {
    /// Events per second, keyed by seconds relative to the CPU series start.
    pub counts: BTreeMap<i64, u64>,
}

impl LogDensity {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }
}

/// Find the log file for one replica count, falling back to the experiment
/// directory when the replica directory has none.
pub fn find_log_file(experiment_dir: &Path, replica_dir: &Path) -> Option<PathBuf> {
    let candidate = replica_dir.join(LOG_FILE_NAME);
    if candidate.exists() {
        return Some(candidate);
    }
    let fallback = experiment_dir.join(LOG_FILE_NAME);
    fallback.exists().then_some(fallback)
}

/// Parse the leading `YYYY-MM-DDTHH:MM:SS` timestamp of a log line, assumed
/// UTC, into Unix seconds. Lines without one carry no density signal.
pub fn parse_leading_timestamp(line: &str) -> Option<i64> {
    let prefix = line.get(..LOG_TIMESTAMP_LEN)?;
    NaiveDateTime::parse_from_str(prefix, LOG_TIMESTAMP_FORMAT)
        .ok()
        .map(|timestamp| timestamp.and_utc().timestamp())
}

/// Bucket log events per whole second and align them to a CPU time axis.
///
/// `cpu_by_second` is keyed by seconds relative to `start`, the CPU group's
/// absolute first-sample timestamp. A log-derived second is kept only when it
/// falls within [`ALIGNMENT_WINDOW_SECS`] of a second already present in the
/// CPU series; everything else is discarded as out-of-window noise.
pub fn correlate<I, S>(cpu_by_second: &BTreeMap<i64, f64>, start: i64, log_lines: I) -> LogDensity
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
    for line in log_lines {
        let Some(timestamp) = parse_leading_timestamp(line.as_ref()) else {
            continue;
        };
        *counts.entry(timestamp - start).or_insert(0) += 1;
    }

    counts.retain(|second, _| {
        cpu_by_second
            .range(second - ALIGNMENT_WINDOW_SECS..=second + ALIGNMENT_WINDOW_SECS)
            .next()
            .is_some()
    });

    LogDensity { counts }
}

/// Read the aligned log density for one replica count.
///
/// Returns `Ok(None)` when no log file exists at either location; the caller
/// then renders the CPU panel alone, without a secondary axis.
pub fn read_log_density(
    experiment_dir: &Path,
    replica_dir: &Path,
    cpu_by_second: &BTreeMap<i64, f64>,
    start: i64,
) -> anyhow::Result<Option<LogDensity>> {
    let Some(path) = find_log_file(experiment_dir, replica_dir) else {
        log::info!("No log data for {}", replica_dir.display());
        return Ok(None);
    };

    let file = std::fs::File::open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let reader = std::io::BufReader::new(file);
    let density = correlate(cpu_by_second, start, reader.lines().map_while(Result::ok));
    Ok(Some(density))
}
