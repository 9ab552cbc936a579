//! Archive naming and atomic file swaps
//!
//! Readers (the dashboard) open the live path at any moment, so the live
//! file is never truncated or rewritten in place. A replacement is always
//! prepared beside it and renamed over it in one step:
//!
//! ```text
//! live_data.csv          (N rows)
//!     │  1. write header-only live_data.csv.tmp
//!     │  2. hard link live_data.csv → live_data_archive_20240506_070809.csv
//!     │  3. rename live_data.csv.tmp → live_data.csv   (atomic replace)
//!     ↓
//! live_data.csv          (header only)
//! live_data_archive_...  (N rows)
//! ```
//!
//! Without hard link support, step 2 becomes a rename of the live file to
//! its archive name, leaving a short window in which the live path is
//! absent but never half written.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::errors::{StorageError, StorageResult};

const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Path of the scratch file prepared beside `live`
pub fn temp_path(live: &Path) -> PathBuf {
    let mut name = live.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    live.with_file_name(name)
}

/// First unused archive path for `live` at time `now`.
///
/// `<stem>_archive_<YYYYmmdd_HHMMSS>.<ext>`, with `_1`, `_2`, ... appended
/// when several rotations land in the same second.
pub fn archive_path(live: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = live
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "live".into());
    let ext = live
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".into());
    let base = format!("{}_archive_{}", stem, now.format(ARCHIVE_TIMESTAMP_FORMAT));

    let mut candidate = live.with_file_name(format!("{}.{}", base, ext));
    let mut suffix = 1u32;
    while candidate.exists() {
        candidate = live.with_file_name(format!("{}_{}.{}", base, suffix, ext));
        suffix += 1;
    }
    candidate
}

/// Write `contents` to `path`, replacing anything there, and flush to disk
pub fn write_file_synced(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

/// Atomically replace `live` with a header-only file
pub fn reset_to_header(live: &Path, header: &str) -> StorageResult<()> {
    let tmp = temp_path(live);
    write_file_synced(&tmp, header).map_err(|e| StorageError::io(&tmp, e))?;
    fs::rename(&tmp, live).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StorageError::io(live, e)
    })
}

/// Move the contents of `live` to a fresh archive and leave a header-only
/// file at the live path. Returns the archive path.
///
/// On failure the live file is left usable: either untouched, or restored
/// from the archive name if the swap got halfway.
pub fn rotate(live: &Path, header: &str, now: DateTime<Local>) -> StorageResult<PathBuf> {
    let rotation_error = |source: io::Error| StorageError::Rotation {
        path: live.to_path_buf(),
        source,
    };

    let archive = archive_path(live, now);
    let tmp = temp_path(live);
    write_file_synced(&tmp, header).map_err(rotation_error)?;

    match fs::hard_link(live, &archive) {
        Ok(()) => {
            if let Err(e) = fs::rename(&tmp, live) {
                let _ = fs::remove_file(&archive);
                let _ = fs::remove_file(&tmp);
                return Err(rotation_error(e));
            }
        }
        Err(link_err) => {
            log::debug!(
                "hard link {} -> {} failed ({}), falling back to rename",
                live.display(),
                archive.display(),
                link_err
            );
            if let Err(e) = fs::rename(live, &archive) {
                let _ = fs::remove_file(&tmp);
                return Err(rotation_error(e));
            }
            if let Err(e) = fs::rename(&tmp, live) {
                let _ = fs::rename(&archive, live);
                let _ = fs::remove_file(&tmp);
                return Err(rotation_error(e));
            }
        }
    }

    Ok(archive)
}
