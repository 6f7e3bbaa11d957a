//! Compactor
//!
//! Rewrites the log without Deleted datums and with every Updated flag
//! cleared. The rewrite goes to a temp file beside the log; the rename over
//! the original is the only step that changes what readers see.

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::log_dir;
use crate::datum::Status;
use crate::error::{Result, RivuletError};

use super::reader::DatumReader;

/// Outcome of one compaction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionStats {
    /// Datums copied to the new file
    pub datums_kept: u64,

    /// Deleted datums dropped
    pub datums_dropped: u64,

    /// Updated datums reset to Normal
    pub datums_normalized: u64,

    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl CompactionStats {
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Compact the log at `path` in place.
///
/// An unreadable datum aborts the pass and leaves the original untouched;
/// the temp file is removed when dropped.
pub fn compact(path: &Path, buffer_size: usize) -> Result<CompactionStats> {
    let mut reader = DatumReader::open(path, buffer_size)?;
    let temp = NamedTempFile::new_in(log_dir(path))?;
    let mut writer = BufWriter::new(temp);

    let mut stats = CompactionStats {
        bytes_before: std::fs::metadata(path)?.len(),
        ..Default::default()
    };

    while let Some(mut datum) = reader.next_datum()? {
        match datum.status {
            Status::Deleted => {
                stats.datums_dropped += 1;
                continue;
            }
            Status::Updated => {
                datum.status = Status::Normal;
                stats.datums_normalized += 1;
            }
            Status::Normal => {}
        }
        stats.bytes_after += datum.write_to(&mut writer)? as u64;
        stats.datums_kept += 1;
    }

    drop(reader);
    writer.flush()?;
    let temp = writer
        .into_inner()
        .map_err(|e| RivuletError::Io(e.into_error()))?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| RivuletError::Io(e.error))?;

    tracing::info!(
        kept = stats.datums_kept,
        dropped = stats.datums_dropped,
        normalized = stats.datums_normalized,
        reclaimed = stats.bytes_reclaimed(),
        "log compacted"
    );
    Ok(stats)
}
