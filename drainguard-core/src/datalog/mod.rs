//! Rotation-Aware CSV Data Logger
//!
//! ## Overview
//!
//! The pipeline persists two append-only streams:
//!
//! - **Readings log**: every accepted reading with its detection
//! - **Alert log**: only raised (anomalous, unsuppressed) detections
//!
//! Downstream readers only ever read these files. The logger therefore
//! guarantees that the live path always holds a complete CSV document:
//! rows are appended whole, and rotation swaps files atomically (see
//! [`rotation`]).
//!
//! ## Rotation
//!
//! ```text
//! log_reading()
//!     ↓
//! live_rows >= max_live_rows ?
//!     ├─ yes → archive live file, start header-only file, live_rows = 0
//!     │        (on failure: log once, keep appending to the live file)
//!     ↓
//! append row, live_rows += 1
//! ```
//!
//! The alert log is never rotated.
//!
//! ## Concurrency
//!
//! One mutex per logger guards both row counts and rotation. Statistics are
//! mirrored into atomics so the status reporter never takes that lock.
//!
//! ## Example
//!
//! ```rust
//! use drainguard_core::datalog::DataLogger;
//!
//! let dir = tempfile::tempdir()?;
//! let logger = DataLogger::new(dir.path().join("live.csv"), dir.path().join("alerts.csv"), 10_000)?;
//! assert_eq!(logger.stats().snapshot().live_rows, 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod rotation;
pub mod row;

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;
use serde::Serialize;

use crate::config::{PathSettings, PipelineSettings};
use crate::errors::{StorageError, StorageResult};
use crate::record::{Alert, EnrichedReading};

pub use row::{CsvRow, ALERT_COLUMNS, READING_COLUMNS};

/// Logger statistics
#[derive(Debug, Default)]
pub struct LoggerStats {
    /// Data rows in the live readings file
    pub live_rows: AtomicUsize,
    /// Data rows in the alert file
    pub alert_count: AtomicU64,
    /// Completed rotations since construction
    pub rotations: AtomicU64,
}

impl LoggerStats {
    /// Plain snapshot of the counters
    pub fn snapshot(&self) -> LoggerStatsSnapshot {
        LoggerStatsSnapshot {
            live_rows: self.live_rows.load(Ordering::Relaxed),
            alert_count: self.alert_count.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`LoggerStats`] at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoggerStatsSnapshot {
    /// Data rows in the live readings file
    pub live_rows: usize,
    /// Data rows in the alert file
    pub alert_count: u64,
    /// Completed rotations
    pub rotations: u64,
}

#[derive(Debug)]
struct LoggerState {
    live_rows: usize,
    alert_rows: u64,
    rotation_failing: bool,
}

/// Thread-safe writer for the readings and alert logs
#[derive(Debug)]
pub struct DataLogger {
    live_path: PathBuf,
    alert_path: PathBuf,
    live_header: String,
    alert_header: String,
    max_live_rows: usize,
    state: Mutex<LoggerState>,
    stats: LoggerStats,
}

impl DataLogger {
    /// Open (creating if needed) both logs and recover their row counts.
    ///
    /// A ceiling of zero is treated as one.
    pub fn new(
        live_path: impl Into<PathBuf>,
        alert_path: impl Into<PathBuf>,
        max_live_rows: usize,
    ) -> StorageResult<Self> {
        let live_path = live_path.into();
        let alert_path = alert_path.into();
        let live_header = row::header_line(&READING_COLUMNS);
        let alert_header = row::header_line(&ALERT_COLUMNS);

        let live_rows = prepare_file(&live_path, &live_header)?;
        let alert_rows = prepare_file(&alert_path, &alert_header)? as u64;

        let stats = LoggerStats::default();
        stats.live_rows.store(live_rows, Ordering::Relaxed);
        stats.alert_count.store(alert_rows, Ordering::Relaxed);

        Ok(Self {
            live_path,
            alert_path,
            live_header,
            alert_header,
            max_live_rows: max_live_rows.max(1),
            state: Mutex::new(LoggerState {
                live_rows,
                alert_rows,
                rotation_failing: false,
            }),
            stats,
        })
    }

    /// Logger for the configured paths and rotation ceiling
    pub fn from_settings(paths: &PathSettings, pipeline: &PipelineSettings) -> StorageResult<Self> {
        Self::new(&paths.live_log, &paths.alert_log, pipeline.max_live_rows)
    }

    /// Append one reading, rotating first if the live file is full
    pub fn log_reading(&self, record: &EnrichedReading) -> StorageResult<()> {
        let mut state = self.lock();

        if state.live_rows >= self.max_live_rows {
            self.rotate_locked(&mut state);
        }

        append(&self.live_path, &record.to_line())?;
        state.live_rows += 1;
        self.stats.live_rows.store(state.live_rows, Ordering::Relaxed);
        Ok(())
    }

    /// Append one alert
    pub fn log_alert(&self, alert: &Alert) -> StorageResult<()> {
        let mut state = self.lock();
        append(&self.alert_path, &alert.to_line())?;
        state.alert_rows += 1;
        self.stats.alert_count.store(state.alert_rows, Ordering::Relaxed);
        Ok(())
    }

    /// Truncate the readings log to its header.
    ///
    /// The alert log and existing archives are left alone.
    pub fn clear_live_data(&self) -> StorageResult<()> {
        let mut state = self.lock();
        rotation::reset_to_header(&self.live_path, &self.live_header)?;
        state.live_rows = 0;
        self.stats.live_rows.store(0, Ordering::Relaxed);
        log::info!("cleared {}", self.live_path.display());
        Ok(())
    }

    /// Logger statistics, readable without locking
    pub fn stats(&self) -> &LoggerStats {
        &self.stats
    }

    /// Readings log path
    pub fn live_path(&self) -> &Path {
        &self.live_path
    }

    /// Alert log path
    pub fn alert_path(&self) -> &Path {
        &self.alert_path
    }

    /// Rotation ceiling
    pub fn max_live_rows(&self) -> usize {
        self.max_live_rows
    }

    fn rotate_locked(&self, state: &mut LoggerState) {
        match rotation::rotate(&self.live_path, &self.live_header, Local::now()) {
            Ok(archive) => {
                log::info!(
                    "rotated {} ({} rows) to {}",
                    self.live_path.display(),
                    state.live_rows,
                    archive.display()
                );
                state.live_rows = 0;
                state.rotation_failing = false;
                self.stats.rotations.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                if !state.rotation_failing {
                    log::error!("{}; continuing with the live file", e);
                }
                state.rotation_failing = true;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoggerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Make sure `path` exists with a header and return its data row count
fn prepare_file(path: &Path, header: &str) -> StorageResult<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let is_empty = match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => return Err(StorageError::io(path, e)),
    };

    if is_empty {
        rotation::write_file_synced(path, header).map_err(|e| StorageError::io(path, e))?;
        log::info!("created {}", path.display());
        return Ok(0);
    }

    count_data_rows(path)
}

/// Lines after the header, ignoring blank lines
fn count_data_rows(path: &Path) -> StorageResult<usize> {
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    let mut lines = 0usize;
    for line in BufReader::new(file).split(b'\n') {
        let line = line.map_err(|e| StorageError::io(path, e))?;
        if !line.iter().all(u8::is_ascii_whitespace) {
            lines += 1;
        }
    }
    Ok(lines.saturating_sub(1))
}

fn append(path: &Path, line: &str) -> StorageResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StorageError::io(path, e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| StorageError::io(path, e))
}
