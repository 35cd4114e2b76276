use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;

/// A single value parsed from a `results_summary.csv` row.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryValue {
    Number(f64),
    Text(String),
}

/// Typed view of a two-column `key,value` summary file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    entries: BTreeMap<String, SummaryValue>,
}

impl Summary {
    pub fn get(&self, key: &str) -> Option<&SummaryValue> {
        self.entries.get(key)
    }

    /// Numeric value for `key`, when the key is present and parsed as one.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(SummaryValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read a `results_summary.csv` file into a [`Summary`].
///
/// Every row with at least two fields becomes one entry keyed by the first
/// field; the second field is kept as a number when it parses as one, as text
/// otherwise. Shorter rows, including blank lines, are skipped. A missing
/// file is an error for the caller to interpret, never an empty summary.
pub fn read_summary(path: &Path) -> anyhow::Result<Summary> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open summary {}", path.display()))?;

    let mut entries = BTreeMap::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Skipping unreadable row in {}: {e}", path.display());
                continue;
            }
        };
        if record.len() < 2 {
            continue;
        }
        let value = match record[1].trim().parse::<f64>() {
            Ok(number) => SummaryValue::Number(number),
            Err(_) => SummaryValue::Text(record[1].to_string()),
        };
        entries.insert(record[0].to_string(), value);
    }

    Ok(Summary { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_summary(content: &str) -> anyhow::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(content.as_bytes())?;
        Ok(file)
    }

    #[test]
    fn numeric_and_text_values() -> anyhow::Result<()> {
        let file = write_summary("avg_latency_ms,12.5\nexecutors,4\nstatus,completed\n")?;
        let summary = read_summary(file.path())?;

        assert_eq!(summary.number("avg_latency_ms"), Some(12.5));
        assert_eq!(summary.number("executors"), Some(4.0));
        assert_eq!(
            summary.get("status"),
            Some(&SummaryValue::Text("completed".to_string()))
        );
        assert_eq!(summary.number("status"), None);
        Ok(())
    }

    #[test]
    fn short_rows_and_blank_lines_are_skipped() -> anyhow::Result<()> {
        let file = write_summary("p95_latency_ms,80.1\n\norphan_key\nprocesses,1000\n")?;
        let summary = read_summary(file.path())?;

        assert_eq!(summary.len(), 2);
        assert_eq!(summary.number("p95_latency_ms"), Some(80.1));
        assert_eq!(summary.number("processes"), Some(1000.0));
        assert_eq!(summary.get("orphan_key"), None);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_summary(Path::new("/nonexistent/results_summary.csv")).is_err());
    }
}
