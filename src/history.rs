use crate::error::FlResult;
use crate::metrics::MetricsResult;
use crate::mode::Mode;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// One finished test as written to the results log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: DateTime<Local>,
    pub mode: Mode,
    pub duration: u32,
    pub elapsed_secs: u64,
    pub wpm: f64,
    pub raw_wpm: f64,
    pub accuracy: f64,
    pub errors: usize,
    pub consistency: f64,
}

impl HistoryRecord {
    pub fn new(result: &MetricsResult, duration: u32) -> Self {
        Self {
            date: Local::now(),
            mode: result.mode,
            duration,
            elapsed_secs: result.time_taken_secs,
            wpm: crate::util::round1(result.wpm),
            raw_wpm: crate::util::round1(result.raw_wpm),
            accuracy: crate::util::round1(result.accuracy),
            errors: result.errors,
            consistency: crate::util::round1(result.consistency),
        }
    }
}

/// Append-only CSV log of results
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new() -> Self {
        Self {
            path: crate::app_dirs::AppDirs::history_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, record: &HistoryRecord) -> FlResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_all(&self) -> FlResult<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for record in reader.deserialize() {
            records.push(record?);
        }
        Ok(records)
    }
}

impl Default for ResultsLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute_metrics;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = tempdir().unwrap();
        let log = ResultsLog::with_path(dir.path().join("results.csv"));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("results.csv");
        let log = ResultsLog::with_path(&path);

        let first = compute_metrics("cat", "cat", Duration::from_secs(60), Mode::Time);
        let second = compute_metrics("cap", "cat", Duration::from_secs(30), Mode::Words);
        log.append(&HistoryRecord::new(&first, 60)).unwrap();
        log.append(&HistoryRecord::new(&second, 25)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("date,mode").count(), 1);

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].mode, Mode::Time);
        assert_eq!(records[1].errors, 1);
        assert_eq!(records[1].accuracy, 66.7);
        assert_eq!(records[1].duration, 25);
    }
}
