//! Updater
//!
//! Replaces field values without moving existing bytes: the replacement is
//! appended under the same record number, then the old datum is marked
//! Deleted in place.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::config::SyncStrategy;
use crate::datum::{Datum, Status};
use crate::error::{Result, RivuletError};

use super::editor::DatumEditor;

/// Outcome of one update batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Old datums found and marked Deleted
    pub superseded: u64,

    /// Datums that had no live on-disk counterpart
    pub missed: u64,

    /// (path, record) of every appended replacement, in file order
    pub appended: Vec<(String, i32)>,

    pub bytes_appended: u64,
}

/// Apply a batch of datums to the log at `log_path`.
///
/// Updated datums are staged, as Normal, in a side file under `side_dir`,
/// and the side file is appended to the log in one pass. Only then does
/// every datum in the batch have its counterpart marked Deleted; the
/// lookup is limited to bytes that existed before the append, so a
/// replacement never supersedes itself. A failure before the marking step
/// leaves the old values live.
pub fn update(
    log_path: &Path,
    side_dir: &Path,
    editor: &DatumEditor<'_>,
    datums: Vec<Datum>,
    sync_strategy: SyncStrategy,
) -> Result<UpdateOutcome> {
    let mut outcome = UpdateOutcome::default();
    let mut side = BufWriter::new(tempfile::tempfile_in(side_dir)?);
    let mut targets = Vec::with_capacity(datums.len());

    for mut datum in datums {
        if datum.status == Status::Updated {
            datum.status = Status::Normal;
            outcome.bytes_appended += datum.write_to(&mut side)? as u64;
            outcome.appended.push((datum.path().to_string(), datum.record));
        }
        targets.push(datum);
    }

    let end = fs::metadata(log_path)?.len();

    if !outcome.appended.is_empty() {
        let mut side = side
            .into_inner()
            .map_err(|e| RivuletError::Io(e.into_error()))?;
        side.seek(SeekFrom::Start(0))?;

        let mut log = OpenOptions::new().append(true).open(log_path)?;
        io::copy(&mut side, &mut log)?;
        log.flush()?;
        if sync_strategy == SyncStrategy::EveryWrite {
            log.sync_data()?;
        }
    }

    for datum in &targets {
        if editor.supersede(datum.path(), datum.record, end)? {
            outcome.superseded += 1;
        } else {
            outcome.missed += 1;
        }
    }

    tracing::info!(
        superseded = outcome.superseded,
        missed = outcome.missed,
        appended = outcome.appended.len(),
        "update batch applied"
    );
    Ok(outcome)
}
