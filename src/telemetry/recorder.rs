//! # Link Telemetry Recorder
//!
//! Appends periodic link snapshots to JSON Lines files.
//!
//! Files are named `link_<UTC timestamp>_<sequence>.jsonl`, rotated after a
//! fixed number of records, and only the newest files are kept.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::stats::LinkStats;
use crate::error::Result;

const FILE_PREFIX: &str = "link_";
const FILE_EXTENSION: &str = "jsonl";

/// One JSONL line
#[derive(Debug, Clone, Serialize)]
pub struct LinkRecord {
    pub timestamp: DateTime<Utc>,
    pub uptime_ms: u64,
    pub enabled: bool,
    pub peer: Option<String>,
    pub stats: LinkStats,
}

/// Rotating JSONL writer
#[derive(Debug)]
pub struct TelemetryRecorder {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    sequence: u32,
}

impl TelemetryRecorder {
    /// Create the log directory if needed; the first file opens lazily
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new<P: AsRef<Path>>(
        dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            sequence: 0,
        })
    }

    /// Append one record, rotating first if the current file is full
    pub fn record(&mut self, record: &LinkRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }

        Ok(())
    }

    /// Path of the file currently written
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.sequence,
            FILE_EXTENSION
        );
        self.sequence = self.sequence.wrapping_add(1);

        let path = self.dir.join(name);
        let file = File::create(&path)?;
        info!("Telemetry log file: {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    fn prune(&self) -> Result<()> {
        let mut files = self.log_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed old telemetry log {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        Ok(())
    }

    fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_log = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION))
                .unwrap_or(false);
            if is_log {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_record(control_frames: u64) -> LinkRecord {
        LinkRecord {
            timestamp: Utc::now(),
            uptime_ms: 1500,
            enabled: true,
            peer: Some("192.168.1.10:22211".to_string()),
            stats: LinkStats { control_frames, ..Default::default() },
        }
    }

    fn count_files(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_writes_json_lines() {
        let dir = TempDir::new().unwrap();
        let mut recorder = TelemetryRecorder::new(dir.path(), 100, 5).unwrap();

        recorder.record(&sample_record(1)).unwrap();
        recorder.record(&sample_record(2)).unwrap();

        let contents = fs::read_to_string(recorder.current_path().unwrap()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed["enabled"], true);
        assert_eq!(parsed["uptime_ms"], 1500);
        assert_eq!(parsed["stats"]["control_frames"], 2);
        assert_eq!(parsed["peer"], "192.168.1.10:22211");
    }

    #[test]
    fn test_rotates_after_max_records() {
        let dir = TempDir::new().unwrap();
        let mut recorder = TelemetryRecorder::new(dir.path(), 2, 10).unwrap();

        for i in 0..5 {
            recorder.record(&sample_record(i)).unwrap();
        }

        assert_eq!(count_files(dir.path()), 3);
    }

    #[test]
    fn test_keeps_only_newest_files() {
        let dir = TempDir::new().unwrap();
        let mut recorder = TelemetryRecorder::new(dir.path(), 1, 2).unwrap();

        for i in 0..6 {
            recorder.record(&sample_record(i)).unwrap();
        }

        assert_eq!(count_files(dir.path()), 2);
        let current = recorder.current_path().unwrap().to_path_buf();
        assert!(current.exists());
        let contents = fs::read_to_string(current).unwrap();
        assert!(contents.contains("\"control_frames\":5"));
    }

    #[test]
    fn test_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let mut recorder = TelemetryRecorder::new(dir.path(), 1, 1).unwrap();

        for i in 0..3 {
            recorder.record(&sample_record(i)).unwrap();
        }

        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(count_files(dir.path()), 2);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut recorder = TelemetryRecorder::new(&nested, 10, 10).unwrap();
        recorder.record(&sample_record(0)).unwrap();
        assert!(nested.exists());
    }
}
