use chrono::NaiveDateTime;
use itertools::Itertools;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Directory name prefix for experiment directories under the results root.
pub const EXPERIMENT_DIR_PREFIX: &str = "scaling_";

const EXPERIMENT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// List experiment directories under `root`, oldest first.
///
/// Only directories whose name starts with [`EXPERIMENT_DIR_PREFIX`] are
/// considered. A missing results root means "no experiments" rather than an
/// error; the caller decides whether that is fatal.
pub fn list_experiments(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        log::info!("Results root {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !name.starts_with(EXPERIMENT_DIR_PREFIX) {
            continue;
        }
        let modified = entry
            .metadata()?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        found.push((modified, entry.path()));
    }

    Ok(found
        .into_iter()
        .sorted_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
        .collect())
}

/// Derive a human readable name for an experiment directory.
///
/// `scaling_20250301_141502` becomes `2025-03-01 14:15`. A name that does not
/// decode falls back to the literal directory name; a malformed name is a
/// display degradation, never an error.
pub fn display_name(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if let Some(encoded) = name.strip_prefix(EXPERIMENT_DIR_PREFIX) {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(encoded, EXPERIMENT_TIMESTAMP_FORMAT) {
            return timestamp.format(DISPLAY_TIMESTAMP_FORMAT).to_string();
        }
    }
    name.to_string()
}
