//! Append-only diagnostic record of the control loop.
//!
//! Every computed time, every decision and every device acknowledgement becomes exactly
//! one line. The file sink flushes after each line so the record survives a crash.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::common::constants::RECORD_TIMESTAMP_FORMAT;

/// Destination for diagnostic records.
pub trait DiagnosticSink {
    /// Append one line. The caller supplies any timestamp.
    fn record(&mut self, line: &str) -> Result<()>;
}

/// Prefix `text` with the wall-clock time of `now` in `timezone`.
pub fn stamped(now: DateTime<Utc>, timezone: Tz, text: &str) -> String {
    let stamp = now.with_timezone(&timezone).format(RECORD_TIMESTAMP_FORMAT);
    format!("[{stamp}] {text}")
}

/// Diagnostic log backed by a text file opened in append mode.
pub struct DiagnosticLog {
    path: PathBuf,
    file: File,
}

impl DiagnosticLog {
    /// Open (or create) the log file for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open diagnostic log {}", path.display()))?;

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn record(&mut self, line: &str) -> Result<()> {
        writeln!(self.file, "{line}")
            .and_then(|_| self.file.flush())
            .with_context(|| format!("Failed to write to {}", self.path.display()))
    }
}

/// In-memory sink whose clones share one buffer, so a test can keep a handle
/// while the scheduler owns the other.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Clone, Default)]
pub struct MemoryLog {
    lines: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(any(test, feature = "testing-support"))]
impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded line.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Recorded lines containing `needle`.
    pub fn matching(&self, needle: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains(needle))
            .collect()
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl DiagnosticSink for MemoryLog {
    fn record(&mut self, line: &str) -> Result<()> {
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_records_are_appended_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lights.log");
        let mut log = DiagnosticLog::open(&path).unwrap();

        log.record("connected").unwrap();
        // Visible on disk without dropping the sink
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "connected\n");

        log.record("south:OK").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "connected\nsouth:OK\n"
        );
    }

    #[test]
    fn test_reopening_keeps_previous_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lights.log");

        DiagnosticLog::open(&path).unwrap().record("first run").unwrap();
        DiagnosticLog::open(&path).unwrap().record("second run").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "first run\nsecond run\n"
        );
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let result = DiagnosticLog::open(dir.path().join("missing").join("lights.log"));
        assert!(result.is_err());
    }

    #[test]
    fn test_stamped_uses_local_wall_clock() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 19, 5, 9).unwrap();

        assert_eq!(
            stamped(now, chrono_tz::US::Pacific, "connected"),
            "[2024-03-20 12:05:09] connected"
        );
        assert_eq!(
            stamped(now, chrono_tz::UTC, "connected"),
            "[2024-03-20 19:05:09] connected"
        );
    }

    #[test]
    fn test_memory_log_clones_share_lines() {
        let log = MemoryLog::new();
        let mut writer = log.clone();

        writer.record("sunset 21:11").unwrap();

        assert_eq!(log.lines(), vec!["sunset 21:11".to_string()]);
        assert_eq!(log.matching("sunset").len(), 1);
        assert!(log.matching("sunrise").is_empty());
    }
}
